// src/database/postgres.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};

use super::{CertificateRecord, CertificateStore, CertificateStream};

/// PostgreSQL certificate store
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create new PostgreSQL store
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        info!("Connecting to PostgreSQL database");

        // sqlx 0.8.x doesn't recognize 'channel_binding' parameter from Neon
        let cleaned_url = Self::clean_connection_string(database_url);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(&cleaned_url)
            .await
            .context("Failed to connect to PostgreSQL database")?;

        info!("Connected to PostgreSQL successfully");

        Ok(Self { pool })
    }

    /// Remove connection string parameters sqlx does not recognize
    fn clean_connection_string(url_str: &str) -> String {
        use url::Url;

        let Ok(mut url) = Url::parse(url_str) else {
            return url_str.to_string();
        };

        let unsupported_params = ["channel_binding"];

        let cleaned_pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !unsupported_params.contains(&key.as_ref()))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        if cleaned_pairs.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(cleaned_pairs);
        }

        url.to_string()
    }

    /// Create the certificates table if it does not exist
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS certificates (
                fingerprint TEXT PRIMARY KEY,
                der BYTEA NOT NULL,
                subject TEXT,
                issuer TEXT,
                serial TEXT,
                not_before BIGINT,
                not_after BIGINT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
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
            WHERE subject IS NOT NULL
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create index on subject")?;

        info!("Database migrations completed successfully");

        Ok(())
    }

    /// Close the database connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn record_from_row(row: &PgRow) -> Result<CertificateRecord> {
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
impl CertificateStore for PostgresStore {
    async fn insert(&self, record: &CertificateRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO certificates (
                fingerprint, der, subject, issuer, serial, not_before, not_after
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (fingerprint) DO NOTHING
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

        debug!("Saved certificate to database: {}", record.fingerprint);

        Ok(())
    }

    async fn retrieve(&self, fingerprint: &str) -> Result<Option<CertificateRecord>> {
        let row = sqlx::query(
            r#"
            SELECT fingerprint, der, subject, issuer, serial, not_before, not_after
            FROM certificates WHERE fingerprint = $1
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
            FROM certificates ORDER BY fingerprint COLLATE "C"
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
        let result = sqlx::query("DELETE FROM certificates WHERE fingerprint = $1")
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
            FROM certificates WHERE subject = $1
            ORDER BY fingerprint COLLATE "C"
            "#,
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch certificates by subject")?;

        debug!("Fetched {} certificates for subject {}", rows.len(), subject);

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
