//! Report output for ct-audit
//!
//! Reports can be written in several formats to several destinations at
//! once; each destination is an [`OutputHandler`].

use crate::types::CertificateReport;
use async_trait::async_trait;
use std::io::Write;
use std::sync::{Mutex, MutexGuard};

pub mod csv;
pub mod human;
pub mod json;

/// Trait for output handlers that render certificate reports
#[async_trait]
pub trait OutputHandler: Send + Sync {
    /// Emit the report for one certificate
    async fn emit_report(&self, report: &CertificateReport) -> anyhow::Result<()>;

    /// Flush any buffered output
    async fn flush(&self) -> anyhow::Result<()>;
}

/// Manager that dispatches reports to multiple handlers
pub struct OutputManager {
    handlers: Vec<Box<dyn OutputHandler>>,
}

impl OutputManager {
    /// Create a new OutputManager
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Add an output handler
    pub fn add_handler(&mut self, handler: Box<dyn OutputHandler>) {
        self.handlers.push(handler);
    }

    /// Emit a report to all handlers
    ///
    /// Errors from individual handlers are logged and do not stop the others.
    /// An error is returned only when every handler failed.
    pub async fn emit(&self, report: &CertificateReport) -> anyhow::Result<()> {
        let mut failures = 0;
        let mut last_error = None;

        for handler in &self.handlers {
            if let Err(e) = handler.emit_report(report).await {
                tracing::warn!("Output handler error: {}", e);
                failures += 1;
                last_error = Some(e);
            }
        }

        match last_error {
            Some(err) if failures == self.handlers.len() => Err(err),
            _ => Ok(()),
        }
    }

    /// Flush all handlers
    pub async fn flush(&self) -> anyhow::Result<()> {
        for handler in &self.handlers {
            handler.flush().await?;
        }
        Ok(())
    }
}

impl Default for OutputManager {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) type SharedWriter = Mutex<Box<dyn Write + Send>>;

pub(crate) fn lock_writer(writer: &SharedWriter) -> anyhow::Result<MutexGuard<'_, Box<dyn Write + Send>>> {
    writer
        .lock()
        .map_err(|_| anyhow::anyhow!("Output writer lock poisoned"))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::Observation;

    struct FailingOutput;

    #[async_trait]
    impl OutputHandler for FailingOutput {
        async fn emit_report(&self, _report: &CertificateReport) -> anyhow::Result<()> {
            anyhow::bail!("sink unavailable")
        }

        async fn flush(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_output_manager_no_handlers() {
        let manager = OutputManager::new();
        let report = test_support::sample_report(Vec::new());

        assert!(manager.emit(&report).await.is_ok());
    }

    #[tokio::test]
    async fn test_output_manager_single_failing_handler() {
        let mut manager = OutputManager::new();
        manager.add_handler(Box::new(FailingOutput));

        let report = test_support::sample_report(vec![Observation::lack_of_crl()]);
        assert!(manager.emit(&report).await.is_err());
    }

    #[tokio::test]
    async fn test_output_manager_partial_failure_is_ok() {
        let file = tempfile::tempfile().unwrap();
        let mut manager = OutputManager::new();
        manager.add_handler(Box::new(FailingOutput));
        manager.add_handler(Box::new(json::JsonOutput::to_file(file)));

        let report = test_support::sample_report(Vec::new());
        assert!(manager.emit(&report).await.is_ok());
        assert!(manager.flush().await.is_ok());
    }
}
