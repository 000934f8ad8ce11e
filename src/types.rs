// src/types.rs
use serde::Serialize;
use std::fmt;

use crate::cert_parser::ParsedCert;
use crate::checks::Observation;

/// Result of running the check engine over one certificate
#[derive(Debug, Clone, Serialize)]
pub struct CertificateReport {
    /// Where the certificate came from (file path or store fingerprint)
    pub source: String,

    /// SHA-256 fingerprint of the DER encoding
    pub fingerprint: String,

    pub subject: Option<String>,

    pub issuer: Option<String>,

    /// DNS names from SAN (or the subject CN)
    pub domains: Vec<String>,

    /// Certificate validity start time (Unix timestamp)
    pub not_before: Option<i64>,

    /// Certificate validity end time (Unix timestamp)
    pub not_after: Option<i64>,

    /// Whether the certificate was written to the store
    pub stored: bool,

    pub observations: Vec<Observation>,
}

impl CertificateReport {
    pub fn new(source: impl Into<String>, cert: &ParsedCert, observations: Vec<Observation>) -> Self {
        Self {
            source: source.into(),
            fingerprint: cert.fingerprint.clone(),
            subject: cert.subject.clone(),
            issuer: cert.issuer.clone(),
            domains: cert.domains.clone(),
            not_before: cert.not_before,
            not_after: cert.not_after,
            stored: false,
            observations,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.observations.is_empty()
    }
}

impl fmt::Display for CertificateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)?;
        if let Some(ref subject) = self.subject {
            write!(f, " ({})", subject)?;
        }
        write!(f, ": {} observation(s)", self.observations.len())
    }
}
