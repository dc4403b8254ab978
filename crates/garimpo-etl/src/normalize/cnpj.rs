//! CNPJ firmographics normalization
//!
//! Reads every CSV under bronze/cnpj, remaps Receita column names to the
//! silver schema, normalizes the 14-digit tax identifier, and writes one
//! deduplicated snapshot. Input schemas vary across archive vintages, so
//! only the columns actually present in a given file are kept; missing
//! fields become nulls for that file's rows.

use crate::config::{EtlConfig, Source};
use crate::error::Result;
use crate::mapping::{cnae_description, normalize_cnpj14};
use crate::normalize::files_with_extension;
use crate::silver::{self, CNPJ_SNAPSHOT};
use arrow_array::{RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Receita column name → silver column name, in snapshot column order.
pub const COLUMN_MAP: &[(&str, &str)] = &[
    ("cnpj", "cnpj14"),
    ("razao_social", "legal_name"),
    ("nome_fantasia", "trade_name"),
    ("situacao_cadastral", "status"),
    ("data_abertura", "opening_date"),
    ("cnae_principal", "cnae"),
    ("natureza_juridica", "legal_nature"),
    ("porte", "size_bracket"),
    ("uf", "uf"),
    ("cod_municipio", "municipality_code"),
    ("cep", "cep"),
];

type Row = HashMap<&'static str, Option<String>>;

/// Normalize all bronze CNPJ files into the firmographics snapshot.
///
/// Returns the snapshot path, or `None` when no input files existed.
pub fn run(config: &EtlConfig) -> Result<Option<PathBuf>> {
    let bronze_dir = config.bronze_dir(Source::Cnpj);
    let csv_files = files_with_extension(&bronze_dir, "csv")?;
    if csv_files.is_empty() {
        info!(bronze = %bronze_dir.display(), "No CNPJ CSV files to normalize");
        return Ok(None);
    }

    let mut rows: Vec<Row> = Vec::new();
    let mut seen_columns: HashSet<&'static str> = HashSet::new();

    for csv_path in &csv_files {
        let (headers, records) = read_csv(csv_path)?;
        let mut mapped: Vec<(usize, &'static str)> = Vec::new();
        for (raw, silver_name) in COLUMN_MAP.iter().copied() {
            if let Some(idx) = headers.iter().position(|h| h.as_str() == raw) {
                mapped.push((idx, silver_name));
                seen_columns.insert(silver_name);
            }
        }
        debug!(
            file = %csv_path.display(),
            records = records.len(),
            mapped_columns = mapped.len(),
            "Parsed bronze CSV"
        );

        for record in &records {
            let mut row: Row = HashMap::new();
            for &(idx, silver_name) in &mapped {
                let value = record
                    .get(idx)
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string);
                row.insert(silver_name, value);
            }
            if let Some(cell) = row.get_mut("cnpj14") {
                *cell = normalize_cnpj14(cell.as_deref());
            }
            if let Some(Some(code)) = row.get("cnae") {
                let desc = cnae_description(code).map(str::to_string);
                row.insert("cnae_desc", desc);
                seen_columns.insert("cnae_desc");
            }
            rows.push(row);
        }
    }

    // Dedup once across the concatenation of all files, keep-first by cnpj14.
    if seen_columns.contains("cnpj14") {
        let mut kept_ids: HashSet<String> = HashSet::new();
        rows.retain(|row| match row.get("cnpj14") {
            Some(Some(id)) => kept_ids.insert(id.clone()),
            _ => false,
        });
    }

    let columns: Vec<&'static str> = COLUMN_MAP
        .iter()
        .map(|(_, silver_name)| *silver_name)
        .chain(std::iter::once("cnae_desc"))
        .filter(|name| seen_columns.contains(name))
        .collect();
    if columns.is_empty() {
        warn!(
            files = csv_files.len(),
            "No recognized columns in any bronze CSV; nothing to snapshot"
        );
        return Ok(None);
    }

    let batch = build_batch(&columns, &rows)?;
    let snapshot_path = config.silver_dir(Source::Cnpj).join(CNPJ_SNAPSHOT);
    silver::write_snapshot(&snapshot_path, &batch)?;
    info!(
        rows = rows.len(),
        files = csv_files.len(),
        snapshot = %snapshot_path.display(),
        "CNPJ normalization complete"
    );
    Ok(Some(snapshot_path))
}

/// Parse a bronze CSV, falling back once to the semicolon delimiter typical
/// of Brazilian exports when the comma parse clearly misfires.
fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<csv::StringRecord>)> {
    match read_csv_with(path, b',') {
        Ok((headers, records)) if !is_misparsed(&headers) => Ok((headers, records)),
        _ => read_csv_with(path, b';'),
    }
}

fn is_misparsed(headers: &[String]) -> bool {
    headers.len() == 1 && headers[0].contains(';')
}

fn read_csv_with(path: &Path, delimiter: u8) -> Result<(Vec<String>, Vec<csv::StringRecord>)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record?);
    }
    Ok((headers, records))
}

fn build_batch(columns: &[&'static str], rows: &[Row]) -> Result<RecordBatch> {
    let fields: Vec<Field> = columns
        .iter()
        .map(|name| Field::new(*name, DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let arrays = columns
        .iter()
        .map(|name| {
            let values: Vec<Option<&str>> = rows
                .iter()
                .map(|row| row.get(name).and_then(|v| v.as_deref()))
                .collect();
            Arc::new(StringArray::from(values)) as arrow_array::ArrayRef
        })
        .collect();

    Ok(RecordBatch::try_new(schema, arrays)?)
}
