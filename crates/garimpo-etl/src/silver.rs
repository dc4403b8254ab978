//! Silver snapshot I/O
//!
//! Each normalize run produces one complete parquet file per source,
//! replacing whatever was there before. A partially written snapshot from an
//! aborted run is not assumed consistent; the next run overwrites it.

use crate::error::Result;
use arrow_array::{RecordBatch, RecordBatchReader};
use arrow_schema::SchemaRef;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use std::path::Path;
use tracing::info;

/// Snapshot filename for CNPJ firmographics.
pub const CNPJ_SNAPSHOT: &str = "cnpj_firmographics.parquet";

/// Snapshot filename for CVM financial facts.
pub const CVM_SNAPSHOT: &str = "cvm_facts.parquet";

/// Write a record batch as a complete snapshot, replacing any prior file.
pub fn write_snapshot(path: &Path, batch: &RecordBatch) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    info!(
        path = %path.display(),
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        "Writing silver snapshot"
    );

    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

/// Read a snapshot back as its schema plus all record batches.
pub fn read_snapshot(path: &Path) -> Result<(SchemaRef, Vec<RecordBatch>)> {
    let file = std::fs::File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let schema = reader.schema();
    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch?);
    }
    Ok((schema, batches))
}
