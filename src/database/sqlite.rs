// src/database/sqlite.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use super::{CertificateRecord, CertificateStore, CertificateStream};

/// SQLite certificate store.
///
/// File-backed databases use WAL journaling, so readers do not block each
/// other and writers are serialized by SQLite. The in-memory variant is a
/// named shared-cache database reachable from every pooled connection, so
/// store calls made while a `scan` stream is open get their own connection.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) a database file and apply the schema
    pub async fn open(path: &Path) -> Result<Self> {
        info!("Opening SQLite certificate store at {}", path.display());

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory {}", parent.display())
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open SQLite database at {}", path.display()))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-process database, gone when the store is dropped
    pub async fn in_memory() -> Result<Self> {
        // sqlx names each `:memory:` database uniquely and opens it with a
        // shared cache, so all connections of this pool see the same data
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("Invalid in-memory SQLite options")?;

        // The database lives as long as one connection is open
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await
            .context("Failed to open in-memory SQLite database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Create the certificates table if it does not exist
    pub async fn migrate(&self) -> Result<()> {
        debug!("Applying SQLite certificate schema");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS certificates (
                fingerprint TEXT PRIMARY KEY,
                der BLOB NOT NULL,
                subject TEXT,
                issuer TEXT,
                serial TEXT,
                not_before INTEGER,
                not_after INTEGER,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create certificates table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_certificates_subject
            ON certificates(subject)
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create index on subject")?;

        Ok(())
    }

    /// Close the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn record_from_row(row: &SqliteRow) -> Result<CertificateRecord> {
        Ok(CertificateRecord {
            fingerprint: row.try_get("fingerprint")?,
            der: row.try_get("der")?,
            subject: row.try_get("subject")?,
            issuer: row.try_get("issuer")?,
            serial: row.try_get("serial")?,
            not_before: row.try_get("not_before")?,
            not_after: row.try_get("not_after")?,
        })
    }
}

#[async_trait]
impl CertificateStore for SqliteStore {
    async fn insert(&self, record: &CertificateRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO certificates (
                fingerprint, der, subject, issuer, serial, not_before, not_after
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(fingerprint) DO NOTHING
            "#,
        )
        .bind(&record.fingerprint)
        .bind(&record.der)
        .bind(&record.subject)
        .bind(&record.issuer)
        .bind(&record.serial)
        .bind(record.not_before)
        .bind(record.not_after)
        .execute(&self.pool)
        .await
        .context("Failed to insert certificate into database")?;

        if result.rows_affected() > 0 {
            debug!("Stored certificate {}", record.fingerprint);
        } else {
            debug!("Certificate {} already stored", record.fingerprint);
        }

        Ok(())
    }

    async fn retrieve(&self, fingerprint: &str) -> Result<Option<CertificateRecord>> {
        let row = sqlx::query(
            r#"
            SELECT fingerprint, der, subject, issuer, serial, not_before, not_after
            FROM certificates WHERE fingerprint = ?1
            "#,
        )
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch certificate")?;

        row.as_ref().map(Self::record_from_row).transpose()
    }

    fn scan(&self) -> CertificateStream<'_> {
        sqlx::query(
            r#"
            SELECT fingerprint, der, subject, issuer, serial, not_before, not_after
            FROM certificates ORDER BY fingerprint
            "#,
        )
        .fetch(&self.pool)
        .map(|row| {
            let row = row.context("Failed to scan certificates")?;
            Self::record_from_row(&row)
        })
        .boxed()
    }

    async fn delete(&self, fingerprint: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM certificates WHERE fingerprint = ?1")
            .bind(fingerprint)
            .execute(&self.pool)
            .await
            .context("Failed to delete certificate")?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM certificates")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count certificates")?;

        Ok(row.try_get::<i64, _>("n")? as u64)
    }

    async fn find_by_subject(&self, subject: &str) -> Result<Vec<CertificateRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT fingerprint, der, subject, issuer, serial, not_before, not_after
            FROM certificates WHERE subject = ?1
            ORDER BY fingerprint
            "#,
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch certificates by subject")?;

        rows.iter().map(Self::record_from_row).collect()
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database ping failed")?;

        Ok(())
    }
}
