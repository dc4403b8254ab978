//! CVM financial-fact normalization
//!
//! The XBRL fact extractor is not implemented yet; that outcome is an
//! explicit [`Extraction::NotImplemented`] variant so the pipeline can tell
//! "extraction is stubbed" apart from "extraction genuinely found nothing".
//! A snapshot is only written once some extraction yields rows.

use crate::config::{EtlConfig, Source};
use crate::error::Result;
use crate::mapping::normalize_cnpj14;
use crate::normalize::files_with_extension;
use crate::silver::{self, CVM_SNAPSHOT};
use arrow_array::{ArrayRef, Float64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// One normalized financial fact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactRow {
    pub cnpj14: Option<String>,
    pub company_name: Option<String>,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub fy: Option<String>,
    pub fq: Option<String>,
    pub concept: Option<String>,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub consolidated: Option<String>,
}

/// Result of attempting fact extraction on one XBRL document.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Extraction logic does not exist yet; distinct from an empty result.
    NotImplemented,
    /// Facts pulled from the document (possibly none).
    Facts(Vec<FactRow>),
}

/// Extract facts from an XBRL filing.
//
// TODO: parse IFRS contexts/entities once the tag mapping is settled; until
// then every document reports the stubbed outcome.
pub fn extract_facts(_xbrl_path: &Path) -> Extraction {
    Extraction::NotImplemented
}

/// Normalize all bronze CVM filings into the facts snapshot.
///
/// Returns the snapshot path, or `None` when no facts were produced.
pub fn run(config: &EtlConfig) -> Result<Option<PathBuf>> {
    let bronze_dir = config.bronze_dir(Source::Cvm);
    let xbrl_files = files_with_extension(&bronze_dir, "xbrl")?;
    if xbrl_files.is_empty() {
        info!(bronze = %bronze_dir.display(), "No CVM XBRL files to normalize");
        return Ok(None);
    }

    let mut facts: Vec<FactRow> = Vec::new();
    let mut stubbed = 0usize;
    for xbrl_path in &xbrl_files {
        match extract_facts(xbrl_path) {
            Extraction::NotImplemented => stubbed += 1,
            Extraction::Facts(mut rows) => {
                for row in &mut rows {
                    row.cnpj14 = normalize_cnpj14(row.cnpj14.as_deref());
                }
                facts.extend(rows);
            }
        }
    }

    if facts.is_empty() {
        if stubbed > 0 {
            warn!(
                files = stubbed,
                "XBRL fact extraction not implemented; no facts produced"
            );
        } else {
            info!(files = xbrl_files.len(), "No facts found in CVM filings");
        }
        return Ok(None);
    }

    let batch = fact_batch(&facts)?;
    let snapshot_path = config.silver_dir(Source::Cvm).join(CVM_SNAPSHOT);
    silver::write_snapshot(&snapshot_path, &batch)?;
    info!(
        rows = facts.len(),
        snapshot = %snapshot_path.display(),
        "CVM normalization complete"
    );
    Ok(Some(snapshot_path))
}

/// Arrange fact rows into the snapshot's column layout.
pub fn fact_batch(rows: &[FactRow]) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("cnpj14", DataType::Utf8, true),
        Field::new("company_name", DataType::Utf8, true),
        Field::new("period_start", DataType::Utf8, true),
        Field::new("period_end", DataType::Utf8, true),
        Field::new("fy", DataType::Utf8, true),
        Field::new("fq", DataType::Utf8, true),
        Field::new("concept", DataType::Utf8, true),
        Field::new("value", DataType::Float64, true),
        Field::new("unit", DataType::Utf8, true),
        Field::new("consolidated", DataType::Utf8, true),
    ]));

    fn text(rows: &[FactRow], get: for<'a> fn(&'a FactRow) -> Option<&'a str>) -> ArrayRef {
        Arc::new(StringArray::from(
            rows.iter().map(|r| get(r)).collect::<Vec<_>>(),
        ))
    }

    let arrays: Vec<ArrayRef> = vec![
        text(rows, |r| r.cnpj14.as_deref()),
        text(rows, |r| r.company_name.as_deref()),
        text(rows, |r| r.period_start.as_deref()),
        text(rows, |r| r.period_end.as_deref()),
        text(rows, |r| r.fy.as_deref()),
        text(rows, |r| r.fq.as_deref()),
        text(rows, |r| r.concept.as_deref()),
        Arc::new(Float64Array::from(
            rows.iter().map(|r| r.value).collect::<Vec<_>>(),
        )),
        text(rows, |r| r.unit.as_deref()),
        text(rows, |r| r.consolidated.as_deref()),
    ];

    Ok(RecordBatch::try_new(schema, arrays)?)
}
