// src/database/mod.rs
use anyhow::Result;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::cert_parser::{fingerprint_der, ParsedCert};
use crate::config::{DatabaseConfig, StoreBackend};

pub mod memory;
pub mod postgres;
pub mod sqlite;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

/// A certificate as persisted by a [`CertificateStore`].
///
/// The fingerprint (SHA-256 of the DER) is the record's identity; the other
/// fields are descriptive and stored alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub fingerprint: String,
    #[serde(with = "der_base64")]
    pub der: Vec<u8>,
    pub subject: Option<String>,
    pub issuer: Option<String>,
    pub serial: Option<String>,
    pub not_before: Option<i64>,
    pub not_after: Option<i64>,
}

impl CertificateRecord {
    /// Record with identity derived from `der` and no metadata
    pub fn new(der: Vec<u8>) -> Self {
        Self {
            fingerprint: fingerprint_der(&der),
            der,
            subject: None,
            issuer: None,
            serial: None,
            not_before: None,
            not_after: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_validity(mut self, not_before: i64, not_after: i64) -> Self {
        self.not_before = Some(not_before);
        self.not_after = Some(not_after);
        self
    }

    /// PEM encoding of the stored DER
    pub fn to_pem(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.der);

        let mut pem = String::from("-----BEGIN CERTIFICATE-----\n");
        for chunk in encoded.as_bytes().chunks(64) {
            pem.push_str(&String::from_utf8_lossy(chunk));
            pem.push('\n');
        }
        pem.push_str("-----END CERTIFICATE-----\n");
        pem
    }
}

impl From<&ParsedCert> for CertificateRecord {
    fn from(cert: &ParsedCert) -> Self {
        Self {
            fingerprint: cert.fingerprint.clone(),
            der: cert.der.clone(),
            subject: cert.subject.clone(),
            issuer: cert.issuer.clone(),
            serial: Some(cert.serial.clone()),
            not_before: cert.not_before,
            not_after: cert.not_after,
        }
    }
}

mod der_base64 {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(der: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(der))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}

/// Lazy pass over every stored certificate
pub type CertificateStream<'a> = BoxStream<'a, Result<CertificateRecord>>;

/// Certificate storage contract shared by every backend.
///
/// Not-found is a normal result (`Ok(None)` / `Ok(false)`); `Err` is reserved
/// for storage and connectivity failures.
#[async_trait]
pub trait CertificateStore: Send + Sync {
    /// Store a certificate. Storing an already-present fingerprint is a no-op.
    async fn insert(&self, record: &CertificateRecord) -> Result<()>;

    /// Fetch a certificate by fingerprint
    async fn retrieve(&self, fingerprint: &str) -> Result<Option<CertificateRecord>>;

    /// Stream every stored certificate in ascending fingerprint order.
    ///
    /// Each call starts a fresh pass.
    fn scan(&self) -> CertificateStream<'_>;

    /// Remove a certificate; returns false if it was not stored
    async fn delete(&self, fingerprint: &str) -> Result<bool>;

    /// Number of stored certificates
    async fn count(&self) -> Result<u64>;

    /// Certificates whose stored subject equals `subject`, by fingerprint
    async fn find_by_subject(&self, subject: &str) -> Result<Vec<CertificateRecord>>;

    /// Health check
    async fn ping(&self) -> Result<()>;
}

/// Open the backend selected in configuration
pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn CertificateStore>> {
    let store: Arc<dyn CertificateStore> = match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory certificate store");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Sqlite if config.path == ":memory:" => {
            Arc::new(SqliteStore::in_memory().await?)
        }
        StoreBackend::Sqlite => {
            Arc::new(SqliteStore::open(std::path::Path::new(&config.path)).await?)
        }
        StoreBackend::Postgres => {
            let postgres = PostgresStore::new(&config.url, config.max_connections).await?;
            postgres.migrate().await?;
            Arc::new(postgres)
        }
    };

    Ok(store)
}
