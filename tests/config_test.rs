// Test configuration loading
use ct_audit::checks::CheckEngine;
use ct_audit::config::{Config, ReportFormat, StoreBackend};
use ct_audit::database::{self, CertificateRecord};
use std::path::Path;

fn test_config() -> Config {
    let config_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/test_config.toml");
    Config::from_file(&config_path).expect("Failed to load test config")
}

#[test]
fn test_load_test_config() {
    let config = test_config();

    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.database.backend, StoreBackend::Sqlite);
    assert_eq!(config.database.path, ":memory:");
    assert_eq!(config.checks.disabled, vec!["crl_corrupt_or_multiple".to_string()]);
    assert_eq!(config.output.format, ReportFormat::Csv);
}

#[test]
fn test_engine_from_config() {
    let config = test_config();
    let engine = CheckEngine::from_config(&config.checks).expect("Failed to build engine");

    assert_eq!(engine.check_names(), vec!["crl_existence"]);
}

#[tokio::test]
async fn test_store_from_config() {
    let config = test_config();
    let store = database::open_store(&config.database)
        .await
        .expect("Failed to open store");

    let record = CertificateRecord::new(b"configured".to_vec());
    store.insert(&record).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 1);
}
