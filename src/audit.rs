// src/audit.rs
//! Glue between the parser, the check engine and the certificate store

use anyhow::{Context, Result};
use futures_util::TryStreamExt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cert_parser::CertificateParser;
use crate::checks::CheckEngine;
use crate::database::{CertificateRecord, CertificateStore};
use crate::types::CertificateReport;

pub struct Auditor {
    engine: CheckEngine,
    store: Option<Arc<dyn CertificateStore>>,
}

impl Auditor {
    pub fn new(engine: CheckEngine) -> Self {
        Self { engine, store: None }
    }

    pub fn with_store(engine: CheckEngine, store: Arc<dyn CertificateStore>) -> Self {
        Self {
            engine,
            store: Some(store),
        }
    }

    /// Parse a certificate file, run the checks and optionally persist it
    pub async fn audit_file(&self, path: &Path, persist: bool) -> Result<CertificateReport> {
        let cert = CertificateParser::parse_file(path)?;
        let observations = self
            .engine
            .run(&cert)
            .with_context(|| format!("Check engine failed on {}", path.display()))?;

        let mut report = CertificateReport::new(path.display().to_string(), &cert, observations);

        if persist {
            let store = self
                .store
                .as_ref()
                .context("No certificate store configured")?;
            store.insert(&CertificateRecord::from(&cert)).await?;
            report.stored = true;
        }

        debug!("Audited {}", report);
        Ok(report)
    }

    /// Re-run the checks over every certificate in the store
    pub async fn audit_store(&self) -> Result<Vec<CertificateReport>> {
        let store = self
            .store
            .as_ref()
            .context("No certificate store configured")?;

        let records: Vec<CertificateRecord> = store.scan().try_collect().await?;
        info!("Auditing {} stored certificates", records.len());

        let mut reports = Vec::with_capacity(records.len());
        for record in records {
            let cert = CertificateParser::parse_der(&record.der).with_context(|| {
                format!("Stored certificate {} no longer parses", record.fingerprint)
            })?;
            let observations = self.engine.run(&cert)?;

            let mut report = CertificateReport::new(format!("store:{}", record.fingerprint), &cert, observations);
            report.stored = true;
            reports.push(report);
        }

        Ok(reports)
    }
}
