// src/cert_parser.rs
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::debug;
use x509_parser::extensions::{DistributionPointName, ParsedExtension};
use x509_parser::oid_registry::{OID_X509_COMMON_NAME, OID_X509_EXT_CRL_DISTRIBUTION_POINTS};
use x509_parser::prelude::*;

use crate::certificate::{Certificate, CrlPointer, ExtensionError};

/// Parsed certificate with extracted metadata
#[derive(Debug, Clone)]
pub struct ParsedCert {
    pub der: Vec<u8>,
    pub fingerprint: String,
    pub domains: Vec<String>,
    pub subject: Option<String>,
    pub issuer: Option<String>,
    pub serial: String,
    pub not_before: Option<i64>,
    pub not_after: Option<i64>,
    crl_points: Result<Vec<CrlPointer>, ExtensionError>,
}

impl Certificate for ParsedCert {
    fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn crl_distribution_points(&self) -> Result<Vec<CrlPointer>, ExtensionError> {
        self.crl_points.clone()
    }
}

/// Certificate parser accepting PEM, raw DER or base64-encoded DER
pub struct CertificateParser;

impl CertificateParser {
    /// Read a file and parse whichever encoding it holds
    pub fn parse_file(path: &Path) -> Result<ParsedCert> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read certificate file {}", path.display()))?;
        Self::parse_bytes(&bytes)
            .with_context(|| format!("Failed to parse certificate from {}", path.display()))
    }

    /// Detect the encoding of `input` and parse it
    pub fn parse_bytes(input: &[u8]) -> Result<ParsedCert> {
        let trimmed = input.trim_ascii();

        if trimmed.starts_with(b"-----BEGIN") {
            Self::parse_pem(trimmed)
        } else if trimmed.first() == Some(&0x30) {
            // SEQUENCE tag: raw DER. Only leading whitespace is safe to strip.
            Self::parse_der(input.trim_ascii_start())
        } else {
            let text = std::str::from_utf8(trimmed)
                .context("Certificate input is neither PEM, DER nor base64")?;
            Self::parse_base64(text)
        }
    }

    /// Parse the first PEM block of `input`
    pub fn parse_pem(input: &[u8]) -> Result<ParsedCert> {
        let (_, pem) = x509_parser::pem::parse_x509_pem(input)
            .map_err(|e| anyhow::anyhow!("Failed to decode PEM certificate: {:?}", e))?;

        if pem.label != "CERTIFICATE" {
            anyhow::bail!("Unexpected PEM label: {}", pem.label);
        }

        Self::parse_der(&pem.contents)
    }

    /// Parse base64-encoded DER
    pub fn parse_base64(base64_der: &str) -> Result<ParsedCert> {
        use base64::Engine;
        let der_bytes = base64::engine::general_purpose::STANDARD
            .decode(base64_der.trim())
            .context("Failed to decode base64 certificate")?;

        Self::parse_der(&der_bytes)
    }

    /// Parse a DER-encoded certificate and extract its metadata.
    ///
    /// Bytes after the certificate's outer SEQUENCE are ignored: the
    /// fingerprint and the stored encoding cover the certificate alone.
    pub fn parse_der(input: &[u8]) -> Result<ParsedCert> {
        let (rem, cert) = X509Certificate::from_der(input)
            .map_err(|e| anyhow::anyhow!("Failed to parse X.509 certificate: {:?}", e))?;

        if !rem.is_empty() {
            debug!("Ignoring {} trailing byte(s) after certificate", rem.len());
        }
        let der_bytes = &input[..input.len() - rem.len()];
        let fingerprint = fingerprint_der(der_bytes);

        // Extract domains from Subject Alternative Name extension
        let mut domains = Vec::new();
        for ext in cert.extensions() {
            if let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension() {
                for general_name in &san.general_names {
                    if let GeneralName::DNSName(dns_name) = general_name {
                        domains.push(dns_name.to_string());
                    }
                }
            }
        }

        let subject = Self::extract_cn(cert.subject()).or_else(|| Some(cert.subject().to_string()));

        // Fallback: use the subject CN as the only domain if there is no SAN
        if domains.is_empty() {
            if let Some(cn) = Self::extract_cn(cert.subject()) {
                domains.push(cn);
            }
        }

        let issuer = Self::extract_cn(cert.issuer()).or_else(|| Some(cert.issuer().to_string()));

        let not_before = Some(cert.validity().not_before.timestamp());
        let not_after = Some(cert.validity().not_after.timestamp());

        Ok(ParsedCert {
            der: der_bytes.to_vec(),
            fingerprint,
            domains,
            subject,
            issuer,
            serial: cert.raw_serial_as_string(),
            not_before,
            not_after,
            crl_points: Self::extract_crl_points(&cert),
        })
    }

    /// Extract Common Name (CN) from a distinguished name
    fn extract_cn(name: &X509Name) -> Option<String> {
        for rdn in name.iter() {
            for attr in rdn.iter() {
                if attr.attr_type() == &OID_X509_COMMON_NAME {
                    if let Ok(cn) = attr.attr_value().as_str() {
                        return Some(cn.to_string());
                    }
                }
            }
        }
        None
    }

    /// Classify the CRL distribution points extension
    fn extract_crl_points(cert: &X509Certificate) -> Result<Vec<CrlPointer>, ExtensionError> {
        let ext = match cert.get_extension_unique(&OID_X509_EXT_CRL_DISTRIBUTION_POINTS) {
            Ok(Some(ext)) => ext,
            Ok(None) => return Ok(Vec::new()),
            Err(X509Error::DuplicateExtensions) => return Err(ExtensionError::MultipleValues),
            Err(e) => return Err(ExtensionError::Other(e.to_string())),
        };

        match ext.parsed_extension() {
            ParsedExtension::CRLDistributionPoints(crl_dp) => {
                let pointers = crl_dp
                    .points
                    .iter()
                    .map(|point| {
                        let mut uris = Vec::new();
                        if let Some(DistributionPointName::FullName(names)) = &point.distribution_point {
                            for name in names {
                                if let GeneralName::URI(uri) = name {
                                    uris.push(uri.to_string());
                                }
                            }
                        }
                        CrlPointer { uris }
                    })
                    .collect();
                Ok(pointers)
            }
            // ParseError, UnsupportedExtension, or a mismatched variant
            _ => Err(ExtensionError::CorruptOrUnrecognized),
        }
    }
}

/// Lowercase hex SHA-256 of a DER encoding
pub fn fingerprint_der(der_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(der_bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_invalid_base64() {
        assert!(CertificateParser::parse_base64("invalid-base64!").is_err());
    }

    #[test]
    fn test_parse_garbage_der() {
        assert!(CertificateParser::parse_der(&[0x30, 0x03, 0x01, 0x02]).is_err());
    }

    #[test]
    fn test_parse_bytes_rejects_non_utf8_garbage() {
        assert!(CertificateParser::parse_bytes(&[0xff, 0xfe, 0x00]).is_err());
    }

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        let fp = fingerprint_der(b"");
        assert_eq!(
            fp,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
