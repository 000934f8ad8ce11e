// src/certificate.rs
//! Certificate accessor capability consumed by the check engine.
//!
//! Checks never see a concrete parser type. They talk to a [`Certificate`],
//! whose accessors either succeed with a value or fail with one of a closed
//! set of [`ExtensionError`] reasons. Tests can therefore supply small fakes
//! instead of building real DER.

use thiserror::Error;

/// Classified failure of an extension accessor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ExtensionError {
    /// The extension is present but its value could not be decoded
    #[error("extension is corrupt or unrecognized")]
    CorruptOrUnrecognized,

    /// The extension occurs more than once in the certificate
    #[error("extension has multiple values")]
    MultipleValues,

    /// Any failure outside the documented reasons (a parser defect)
    #[error("unexpected extension accessor failure: {0}")]
    Other(String),
}

/// A single CRL distribution point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrlPointer {
    /// URIs listed in the point's full name. Empty when the point is only
    /// expressed relative to the CRL issuer.
    pub uris: Vec<String>,
}

impl CrlPointer {
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            uris: vec![uri.into()],
        }
    }
}

/// Minimal accessor set a check needs from a parsed certificate
pub trait Certificate: Send + Sync {
    /// Lowercase hex SHA-256 of the DER encoding
    fn fingerprint(&self) -> &str;

    /// CRL distribution points (OID 2.5.29.31).
    ///
    /// A certificate without the extension yields an empty list.
    fn crl_distribution_points(&self) -> Result<Vec<CrlPointer>, ExtensionError>;
}
