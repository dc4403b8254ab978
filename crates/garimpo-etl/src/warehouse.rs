//! Warehouse loader (silver → SQLite)
//!
//! Makes each warehouse table reflect exactly the current silver snapshot:
//! delete every existing row, then reinsert the snapshot's rows, all inside
//! one transaction per source so a crash can never leave a table empty
//! between the two steps. It is a full replace, never a merge.

use crate::config::{EtlConfig, Source};
use crate::error::{EtlError, Result};
use crate::ledger::{INDICES_SQL, SCHEMA_SQL};
use crate::silver::{self, CNPJ_SNAPSHOT, CVM_SNAPSHOT};
use arrow_array::{Array, Float64Array, RecordBatch, StringArray};
use arrow_schema::DataType;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::path::Path;
use tracing::{debug, info};

/// Handle on the warehouse SQLite file.
pub struct Warehouse {
    pool: SqlitePool,
}

impl Warehouse {
    /// Open (creating if missing) the warehouse and ensure its schema.
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

        let warehouse = Self { pool };
        warehouse.ensure_schema().await?;
        Ok(warehouse)
    }

    /// Idempotently apply the table and index definition scripts.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        sqlx::raw_sql(INDICES_SQL).execute(&self.pool).await?;
        debug!("Warehouse schema ensured");
        Ok(())
    }

    /// Load every source's silver snapshot into its warehouse table.
    pub async fn load(&self, config: &EtlConfig) -> Result<()> {
        self.ensure_schema().await?;

        let cnpj_snapshot = config.silver_dir(Source::Cnpj).join(CNPJ_SNAPSHOT);
        self.load_source("cnpj_firmographics", &cnpj_snapshot).await?;

        let cvm_snapshot = config.silver_dir(Source::Cvm).join(CVM_SNAPSHOT);
        self.load_source("cvm_facts", &cvm_snapshot).await?;

        info!(warehouse = %config.warehouse_path.display(), "Silver datasets loaded");
        Ok(())
    }

    /// Replace one table's contents with a snapshot's rows.
    ///
    /// A missing snapshot is a logged skip, not an error, so partial
    /// pipelines (one source normalized, the other not) still load cleanly.
    /// Returns the number of rows inserted, or `None` when skipped.
    pub async fn load_source(&self, table: &str, snapshot: &Path) -> Result<Option<u64>> {
        if !snapshot.exists() {
            info!(table, snapshot = %snapshot.display(), "Skipping load: snapshot missing");
            return Ok(None);
        }

        let (schema, batches) = silver::read_snapshot(snapshot)?;
        let columns: Vec<String> = schema
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        let placeholders: Vec<String> =
            (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders.join(", ")
        );

        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *tx)
            .await?;

        let mut inserted = 0u64;
        for batch in &batches {
            for row in 0..batch.num_rows() {
                let mut query = sqlx::query(&insert_sql);
                query = bind_row(query, batch, row)?;
                query.execute(&mut *tx).await?;
                inserted += 1;
            }
        }
        tx.commit().await?;

        if inserted == 0 {
            info!(table, "No rows to load (empty snapshot)");
        } else {
            info!(table, rows = inserted, "Loaded");
        }
        Ok(Some(inserted))
    }

    /// Row count of a warehouse table.
    pub async fn count(&self, table: &str) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// Shared access to the underlying pool (ledger lives in the same file).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Bind one snapshot row's values, mapping arrow nulls to SQL NULL.
fn bind_row<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    batch: &RecordBatch,
    row: usize,
) -> Result<sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>> {
    for (i, field) in batch.schema().fields().iter().enumerate() {
        let column = batch.column(i);
        match field.data_type() {
            DataType::Utf8 => {
                let values = column
                    .as_any()
                    .downcast_ref::<StringArray>()
                    .ok_or_else(|| unsupported(field.name(), field.data_type()))?;
                let value: Option<String> = if values.is_null(row) {
                    None
                } else {
                    Some(values.value(row).to_string())
                };
                query = query.bind(value);
            }
            DataType::Float64 => {
                let values = column
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .ok_or_else(|| unsupported(field.name(), field.data_type()))?;
                let value: Option<f64> = if values.is_null(row) {
                    None
                } else {
                    Some(values.value(row))
                };
                query = query.bind(value);
            }
            other => return Err(unsupported(field.name(), other)),
        }
    }
    Ok(query)
}

fn unsupported(column: &str, data_type: &DataType) -> EtlError {
    EtlError::UnsupportedColumn {
        column: column.to_string(),
        data_type: data_type.to_string(),
    }
}
