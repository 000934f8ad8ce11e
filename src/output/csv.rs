//! CSV output handler
//!
//! One row per observation. A certificate without findings still gets a
//! single row with the observation columns left empty.

use crate::output::{lock_writer, OutputHandler, SharedWriter};
use crate::types::CertificateReport;
use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::Mutex;

const HEADER: [&str; 8] = [
    "source",
    "fingerprint",
    "subject",
    "issuer",
    "stored",
    "kind",
    "severity",
    "details",
];

/// CSV output handler
pub struct CsvOutput {
    writer: SharedWriter,
    header_written: Mutex<bool>,
}

impl CsvOutput {
    /// Create a new CsvOutput that writes to stdout
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
            header_written: Mutex::new(false),
        }
    }

    /// Create a new CsvOutput that writes to a file
    pub fn to_file(file: std::fs::File) -> Self {
        Self {
            writer: Mutex::new(Box::new(file)),
            header_written: Mutex::new(false),
        }
    }

    /// Serialize the rows for one report, with the header if not yet written
    fn encode(&self, report: &CertificateReport) -> anyhow::Result<Vec<u8>> {
        let mut csv_writer = csv::WriterBuilder::new().from_writer(Vec::new());

        {
            let mut header_written = self
                .header_written
                .lock()
                .map_err(|_| anyhow::anyhow!("CSV header lock poisoned"))?;
            if !*header_written {
                csv_writer.write_record(HEADER)?;
                *header_written = true;
            }
        }

        let subject = report.subject.as_deref().unwrap_or_default();
        let issuer = report.issuer.as_deref().unwrap_or_default();
        let stored = if report.stored { "true" } else { "false" };

        if report.observations.is_empty() {
            csv_writer.write_record([
                report.source.as_str(),
                report.fingerprint.as_str(),
                subject,
                issuer,
                stored,
                "",
                "",
                "",
            ])?;
        }

        for observation in &report.observations {
            let severity = observation.severity.to_string();
            csv_writer.write_record([
                report.source.as_str(),
                report.fingerprint.as_str(),
                subject,
                issuer,
                stored,
                observation.kind.as_str(),
                severity.as_str(),
                observation.details.as_deref().unwrap_or_default(),
            ])?;
        }

        csv_writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to finish CSV rows: {}", e))
    }
}

impl Default for CsvOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputHandler for CsvOutput {
    async fn emit_report(&self, report: &CertificateReport) -> anyhow::Result<()> {
        let rows = self.encode(report)?;

        let mut writer = lock_writer(&self.writer)?;
        writer.write_all(&rows)?;
        writer.flush()?;
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        lock_writer(&self.writer)?.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{Observation, ObservationKind};
    use crate::output::test_support::sample_report;

    #[test]
    fn test_csv_header_written_once() {
        let handler = CsvOutput::to_file(tempfile::tempfile().unwrap());

        let first = String::from_utf8(handler.encode(&sample_report(Vec::new())).unwrap()).unwrap();
        let second = String::from_utf8(handler.encode(&sample_report(Vec::new())).unwrap()).unwrap();

        assert!(first.starts_with("source,fingerprint,subject,issuer,stored,kind,severity,details\n"));
        assert_eq!(first.lines().count(), 2);
        assert_eq!(second.lines().count(), 1);
        assert!(!second.contains("fingerprint"));
    }

    #[test]
    fn test_csv_one_row_per_observation() {
        let handler = CsvOutput::to_file(tempfile::tempfile().unwrap());
        let report = sample_report(vec![
            Observation::lack_of_crl(),
            Observation::with_details(ObservationKind::CorruptCrlExtension, "tag, length"),
        ]);

        let text = String::from_utf8(handler.encode(&report).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with(",false,lack_of_crl,warning,"));
        // Field containing a comma is quoted
        assert!(lines[2].ends_with(",corrupt_crl_extension,error,\"tag, length\""));
    }

    #[tokio::test]
    async fn test_csv_output() {
        let handler = CsvOutput::new();
        let report = sample_report(vec![Observation::lack_of_crl()]);

        assert!(handler.emit_report(&report).await.is_ok());
    }
}
