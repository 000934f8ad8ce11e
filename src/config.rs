// src/config.rs

use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    /// SQLite database file; ":memory:" keeps everything in process
    #[serde(default = "default_database_path")]
    pub path: String,
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_backend() -> StoreBackend { StoreBackend::Sqlite }
fn default_database_path() -> String { "ct-audit.db".to_string() }
fn default_database_url() -> String {
    "postgresql://localhost/ctaudit".to_string()
}
fn default_max_connections() -> u32 { 5 }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_database_path(),
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ChecksConfig {
    /// Names of built-in checks to skip
    #[serde(default)]
    pub disabled: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Human,
    Json,
    Csv,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: ReportFormat,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub checks: ChecksConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&contents)?;
        Ok(cfg)
    }

    /// Load `path` if given, otherwise fall back to defaults
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_config_from_valid_toml() {
        let temp_file = write_config(
            r#"
[logging]
level = "debug"

[database]
backend = "postgres"
url = "postgresql://db.internal/certs"
max_connections = 12

[checks]
disabled = ["crl_existence"]

[output]
format = "json"
            "#,
        );

        let config = Config::from_file(temp_file.path()).unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.database.backend, StoreBackend::Postgres);
        assert_eq!(config.database.url, "postgresql://db.internal/certs");
        assert_eq!(config.database.max_connections, 12);
        assert_eq!(config.database.path, "ct-audit.db");
        assert_eq!(config.checks.disabled, vec!["crl_existence".to_string()]);
        assert_eq!(config.output.format, ReportFormat::Json);
    }

    #[test]
    fn test_config_empty_toml_uses_defaults() {
        let temp_file = write_config("");
        let config = Config::from_file(temp_file.path()).unwrap();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.database.backend, StoreBackend::Sqlite);
        assert_eq!(config.database.max_connections, 5);
        assert!(config.checks.disabled.is_empty());
        assert_eq!(config.output.format, ReportFormat::Human);
    }

    #[test]
    fn test_config_unknown_backend() {
        let temp_file = write_config(
            r#"
[database]
backend = "mongodb"
            "#,
        );
        assert!(Config::from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_config_invalid_toml() {
        let temp_file = write_config("invalid toml content {{{");
        assert!(Config::from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_config_nonexistent_file() {
        let result = Config::from_file(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_without_path() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.database.path, "ct-audit.db");
    }
}
