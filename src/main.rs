// src/main.rs
use anyhow::Context;
use clap::Parser;
use ct_audit::audit::Auditor;
use ct_audit::cert_parser::CertificateParser;
use ct_audit::checks::CheckEngine;
use ct_audit::cli::{Cli, Command, StoreCommand};
use ct_audit::config::{Config, ReportFormat};
use ct_audit::database::{self, CertificateRecord, CertificateStore};
use ct_audit::output::{csv, human, json, OutputHandler, OutputManager};
use futures_util::StreamExt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Validate arguments
    cli.validate()?;

    let config = Config::load(cli.config.as_deref())?;

    // Initialize logging; reports own stdout
    let log_level = cli
        .log_level_override()
        .unwrap_or(config.logging.level.as_str());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let format = cli.output_format(config.output.format);
    let output = build_output(format, cli.output.as_ref())?;

    let engine = CheckEngine::from_config(&config.checks)?;
    tracing::debug!("Enabled checks: {}", engine.check_names().join(", "));

    match cli.command {
        Command::Check { files, store } => {
            let auditor = if store {
                Auditor::with_store(engine, database::open_store(&config.database).await?)
            } else {
                Auditor::new(engine)
            };

            let mut failed = 0;
            for path in &files {
                match auditor.audit_file(path, store).await {
                    Ok(report) => output.emit(&report).await?,
                    Err(e) => {
                        tracing::error!("{:#}", e);
                        failed += 1;
                    }
                }
            }
            output.flush().await?;

            if failed > 0 {
                tracing::warn!("{} of {} certificate(s) could not be checked", failed, files.len());
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Store(command) => {
            let store = database::open_store(&config.database).await?;
            store.ping().await?;
            return run_store_command(command, store, engine, &output, format).await;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn build_output(format: ReportFormat, path: Option<&PathBuf>) -> anyhow::Result<OutputManager> {
    let mut output_manager = OutputManager::new();

    let file = match path {
        Some(path) => Some(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?,
        ),
        None => None,
    };

    let handler: Box<dyn OutputHandler> = match (format, file) {
        (ReportFormat::Human, Some(file)) => Box::new(human::HumanOutput::to_file(file)),
        (ReportFormat::Human, None) => Box::new(human::HumanOutput::new()),
        (ReportFormat::Json, Some(file)) => Box::new(json::JsonOutput::to_file(file)),
        (ReportFormat::Json, None) => Box::new(json::JsonOutput::new()),
        (ReportFormat::Csv, Some(file)) => Box::new(csv::CsvOutput::to_file(file)),
        (ReportFormat::Csv, None) => Box::new(csv::CsvOutput::new()),
    };
    output_manager.add_handler(handler);

    Ok(output_manager)
}

fn print_record(record: &CertificateRecord, format: ReportFormat) -> anyhow::Result<()> {
    match format {
        ReportFormat::Json => println!("{}", serde_json::to_string(record)?),
        _ => println!(
            "{}  {}",
            record.fingerprint,
            record.subject.as_deref().unwrap_or("<no subject>")
        ),
    }
    Ok(())
}

async fn run_store_command(
    command: StoreCommand,
    store: Arc<dyn CertificateStore>,
    engine: CheckEngine,
    output: &OutputManager,
    format: ReportFormat,
) -> anyhow::Result<ExitCode> {
    match command {
        StoreCommand::Insert { files } => {
            let mut failed = 0;
            for path in &files {
                match CertificateParser::parse_file(path) {
                    Ok(cert) => {
                        store.insert(&CertificateRecord::from(&cert)).await?;
                        println!("{}  {}", cert.fingerprint, path.display());
                    }
                    Err(e) => {
                        tracing::error!("{:#}", e);
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        StoreCommand::Get { fingerprint, pem } => match store.retrieve(&fingerprint).await? {
            Some(record) if pem => print!("{}", record.to_pem()),
            Some(record) => print_record(&record, format)?,
            None => {
                eprintln!("Certificate {} not found", fingerprint);
                return Ok(ExitCode::FAILURE);
            }
        },
        StoreCommand::List { subject: Some(subject) } => {
            for record in store.find_by_subject(&subject).await? {
                print_record(&record, format)?;
            }
        }
        StoreCommand::List { subject: None } => {
            let mut records = store.scan();
            while let Some(record) = records.next().await {
                print_record(&record?, format)?;
            }
        }
        StoreCommand::Delete { fingerprint } => {
            if !store.delete(&fingerprint).await? {
                eprintln!("Certificate {} not found", fingerprint);
                return Ok(ExitCode::FAILURE);
            }
            tracing::info!("Deleted certificate {}", fingerprint);
        }
        StoreCommand::Count => println!("{}", store.count().await?),
        StoreCommand::Audit => {
            let auditor = Auditor::with_store(engine, store);
            for report in auditor.audit_store().await? {
                output.emit(&report).await?;
            }
            output.flush().await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
