//! JSON Lines (JSONL) output handler

use crate::output::{lock_writer, OutputHandler, SharedWriter};
use crate::types::CertificateReport;
use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::Mutex;

/// JSON Lines output handler
///
/// Outputs one JSON object per certificate report
pub struct JsonOutput {
    writer: SharedWriter,
}

impl JsonOutput {
    /// Create a new JsonOutput that writes to stdout
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a new JsonOutput that writes to a file
    pub fn to_file(file: std::fs::File) -> Self {
        Self {
            writer: Mutex::new(Box::new(file)),
        }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputHandler for JsonOutput {
    async fn emit_report(&self, report: &CertificateReport) -> anyhow::Result<()> {
        let json = serde_json::to_string(report)?;

        let mut writer = lock_writer(&self.writer)?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;

        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        lock_writer(&self.writer)?.flush()?;
        Ok(())
    }
}
