//! Ingest ledger
//!
//! Persistent, append-only registry of every raw file the pipeline has seen,
//! keyed by (source, path) with a SHA-256 digest and byte size. Discovery is
//! first-seen-wins: re-encountering a logged path is a no-op, even when the
//! file's content changed on disk. Rows are never updated or deleted; the
//! table doubles as an audit trail.

use crate::config::Source;
use crate::error::Result;
use garimpo_common::checksum;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Full warehouse schema; every table is `CREATE TABLE IF NOT EXISTS` so the
/// script is safe to apply on each startup.
pub const SCHEMA_SQL: &str = include_str!("../sql/schema.sql");

/// Index definitions, equally idempotent.
pub const INDICES_SQL: &str = include_str!("../sql/indices.sql");

/// Handle on the ledger table inside the warehouse SQLite file.
pub struct IngestLedger {
    pool: SqlitePool,
}

impl IngestLedger {
    /// Open (creating if missing) the warehouse file and ensure the schema.
    pub async fn connect(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let ledger = Self { pool };
        ledger.ensure_schema().await?;
        Ok(ledger)
    }

    /// Wrap an existing pool (shared with the warehouse loader).
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Idempotently apply the schema and index scripts.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        sqlx::raw_sql(INDICES_SQL).execute(&self.pool).await?;
        debug!("Ledger schema ensured");
        Ok(())
    }

    /// Discover raw files under `roots` and log any not yet seen.
    ///
    /// Every regular file is hashed and measured; inserts use the
    /// (source, path) uniqueness so already-logged paths are silently
    /// ignored. All inserts of one pass share a transaction: an unreadable
    /// file aborts the pass with the ledger unchanged for files not yet
    /// reached, and a re-run picks up the remainder cleanly.
    ///
    /// Returns the number of newly logged files.
    pub async fn discover(&self, source: Source, roots: &[PathBuf]) -> Result<u64> {
        self.ensure_schema().await?;

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for root in roots {
            if !root.exists() {
                debug!(root = %root.display(), "Discovery root missing; skipping");
                continue;
            }
            for entry in WalkDir::new(root).sort_by_file_name() {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                let digest = checksum::sha256_file(path)?;
                let bytes = entry.metadata()?.len() as i64;

                let result = sqlx::query(
                    r#"
                    INSERT OR IGNORE INTO file_ingest_log (source, path, sha256, bytes, stage)
                    VALUES (?1, ?2, ?3, ?4, 'raw')
                    "#,
                )
                .bind(source.as_str())
                .bind(path.to_string_lossy().as_ref())
                .bind(&digest)
                .bind(bytes)
                .execute(&mut *tx)
                .await?;
                inserted += result.rows_affected();
            }
        }

        tx.commit().await?;
        info!(source = %source, inserted, "Discovery pass complete");
        Ok(inserted)
    }

    /// Number of ledger rows for a source.
    pub async fn count(&self, source: Source) -> Result<i64> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM file_ingest_log WHERE source = ?1")
                .bind(source.as_str())
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }

    /// Digest recorded for a (source, path) pair, if logged.
    pub async fn digest_of(&self, source: Source, path: &Path) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT sha256 FROM file_ingest_log WHERE source = ?1 AND path = ?2",
        )
        .bind(source.as_str())
        .bind(path.to_string_lossy().as_ref())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(digest,)| digest))
    }
}
