//! Human-readable colored terminal output

use crate::checks::Severity;
use crate::output::{lock_writer, OutputHandler, SharedWriter};
use crate::types::CertificateReport;
use async_trait::async_trait;
use colored::Colorize;
use std::io::{self, Write};
use std::sync::Mutex;

/// Human-readable output handler with colored terminal output
pub struct HumanOutput {
    writer: SharedWriter,
    use_colors: bool,
}

impl HumanOutput {
    /// Create a new HumanOutput that writes to stdout
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
            use_colors: is_terminal::is_terminal(std::io::stdout()),
        }
    }

    /// Create a new HumanOutput that writes to a file
    pub fn to_file(file: std::fs::File) -> Self {
        Self {
            writer: Mutex::new(Box::new(file)),
            use_colors: false, // No colors when writing to file
        }
    }

    /// Format a timestamp as human-readable string
    fn format_timestamp(ts: i64) -> String {
        use chrono::DateTime;

        match DateTime::from_timestamp(ts, 0) {
            Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => ts.to_string(),
        }
    }

    fn render(&self, report: &CertificateReport) -> String {
        let mut out = String::new();
        let subject = report.subject.as_deref().unwrap_or("<no subject>");

        let marker = if report.is_clean() { "[ok]" } else { "[!]" };
        if self.use_colors {
            let marker = if report.is_clean() {
                marker.green().bold()
            } else {
                marker.red().bold()
            };
            out.push_str(&format!("{} {} {}\n", marker, subject.cyan().bold(), report.source.dimmed()));
        } else {
            out.push_str(&format!("{} {} {}\n", marker, subject, report.source));
        }

        out.push_str(&format!("    Fingerprint: {}\n", report.fingerprint));

        if let Some(ref issuer) = report.issuer {
            out.push_str(&format!("    Issuer: {}\n", issuer));
        }

        if let (Some(nb), Some(na)) = (report.not_before, report.not_after) {
            out.push_str(&format!(
                "    Valid: {} .. {}\n",
                Self::format_timestamp(nb),
                Self::format_timestamp(na)
            ));
        }

        if report.domains.len() > 1 {
            out.push_str(&format!("    Domains: {}\n", report.domains.join(", ")));
        }

        if report.stored {
            out.push_str("    Stored: yes\n");
        }

        for observation in &report.observations {
            let label = format!("[{}]", observation.severity);
            let label = if self.use_colors {
                match observation.severity {
                    Severity::Error => label.red().to_string(),
                    Severity::Warning => label.yellow().to_string(),
                    Severity::Notice => label.dimmed().to_string(),
                }
            } else {
                label
            };

            out.push_str(&format!("    {} {}", label, observation.description));
            if let Some(ref details) = observation.details {
                out.push_str(&format!(": {}", details));
            }
            out.push('\n');
        }

        out
    }
}

impl Default for HumanOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputHandler for HumanOutput {
    async fn emit_report(&self, report: &CertificateReport) -> anyhow::Result<()> {
        let text = self.render(report);

        let mut writer = lock_writer(&self.writer)?;
        writer.write_all(text.as_bytes())?;
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

    fn plain() -> HumanOutput {
        HumanOutput::to_file(tempfile::tempfile().unwrap())
    }

    #[test]
    fn test_render_clean_report() {
        let text = plain().render(&sample_report(Vec::new()));

        assert!(text.starts_with("[ok] leaf.example.com certs/leaf.pem\n"));
        assert!(text.contains("Issuer: Example CA"));
        assert!(text.contains("Valid: 2020-09-13 12:26:40 .. 2023-11-14 22:13:20"));
        assert!(text.contains("Domains: leaf.example.com, www.leaf.example.com"));
    }

    #[test]
    fn test_render_observations() {
        let report = sample_report(vec![
            Observation::lack_of_crl(),
            Observation::with_details(ObservationKind::CorruptCrlExtension, "bad tag"),
        ]);
        let text = plain().render(&report);

        assert!(text.starts_with("[!] "));
        assert!(text.contains("[warning] Certificate has no CRL distribution points\n"));
        assert!(text.contains("[error] CRL distribution points extension is corrupt: bad tag\n"));
    }

    #[tokio::test]
    async fn test_human_output() {
        let handler = HumanOutput::new();
        let report = sample_report(vec![Observation::lack_of_crl()]);

        assert!(handler.emit_report(&report).await.is_ok());
        assert!(handler.flush().await.is_ok());
    }
}
