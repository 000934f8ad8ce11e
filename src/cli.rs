// src/cli.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ReportFormat;

/// ct-audit: certificate checks and storage for CT tooling
///
/// Runs structural checks over X.509 certificates (PEM, DER or base64 DER)
/// and keeps certificates in a pluggable certificate store.
#[derive(Parser, Debug, Clone)]
#[command(name = "ct-audit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to TOML config file (defaults apply when omitted)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Output reports in JSONL format
    #[arg(short = 'j', long = "json", global = true)]
    pub json: bool,

    /// Output reports in CSV format
    #[arg(long = "csv", global = true)]
    pub csv: bool,

    /// Write output to file instead of stdout
    #[arg(short = 'o', long = "output", global = true)]
    pub output: Option<PathBuf>,

    /// Verbose logging (set log level to debug)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Quiet logging (set log level to warn)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run every enabled check over one or more certificate files
    Check {
        /// Certificate files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Also insert each parsed certificate into the configured store
        #[arg(long = "store")]
        store: bool,
    },

    /// Manage the certificate store
    #[command(subcommand)]
    Store(StoreCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum StoreCommand {
    /// Parse certificate files and insert them
    Insert {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print a stored certificate
    Get {
        #[arg(value_parser = parse_fingerprint)]
        fingerprint: String,

        /// Print the certificate as PEM instead of a summary
        #[arg(long = "pem")]
        pem: bool,
    },

    /// List stored certificates
    List {
        /// Only certificates with exactly this subject
        #[arg(long = "subject")]
        subject: Option<String>,
    },

    /// Delete a stored certificate
    Delete {
        #[arg(value_parser = parse_fingerprint)]
        fingerprint: String,
    },

    /// Print the number of stored certificates
    Count,

    /// Re-run the checks over every stored certificate
    Audit,
}

/// Accept a SHA-256 fingerprint in either case; stored identities are lowercase
fn parse_fingerprint(value: &str) -> Result<String, String> {
    if value.len() != 64 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!(
            "fingerprint must be 64 hex characters (SHA-256), got '{}'",
            value
        ));
    }
    Ok(value.to_ascii_lowercase())
}

impl Cli {
    /// Validate flag combinations and return errors for invalid usage
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.json && self.csv {
            anyhow::bail!(
                "Cannot specify multiple output formats. \
                Choose one of: --json or --csv"
            );
        }

        if self.verbose && self.quiet {
            anyhow::bail!("Cannot specify both --verbose and --quiet");
        }

        Ok(())
    }

    /// Output format from flags, falling back to the configured one
    pub fn output_format(&self, configured: ReportFormat) -> ReportFormat {
        if self.json {
            ReportFormat::Json
        } else if self.csv {
            ReportFormat::Csv
        } else {
            configured
        }
    }

    /// Log level override from verbose/quiet flags
    pub fn log_level_override(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("warn")
        } else {
            None
        }
    }
}
