//! Pipeline configuration
//!
//! All stage entry points take an explicit [`EtlConfig`] instead of reading
//! global path constants, so tests can point the whole pipeline at temporary
//! directories. Defaults mirror the conventional `data/` layout.

use std::path::{Path, PathBuf};

// ============================================================================
// Remote endpoints and defaults
// ============================================================================

/// Receita Federal CNPJ open-data root (monthly YYYY-MM subdirectories).
pub const DEFAULT_CNPJ_BASE_URL: &str =
    "https://arquivos.receitafederal.gov.br/dados/cnpj/dados_abertos_cnpj/";

/// CVM open-data root; `{doc}` is replaced with the document set (ITR, DFP, ...).
pub const DEFAULT_CVM_BASE_URL_TEMPLATE: &str =
    "https://dados.cvm.gov.br/dados/CIA_ABERTA/DOC/{doc}/DADOS/";

/// Per-request HTTP timeout in seconds (probe and fetch alike).
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// A tracked dataset source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Receita Federal company registry (firmographics)
    Cnpj,
    /// CVM financial disclosures (ITR/DFP)
    Cvm,
}

impl Source {
    /// Tag used in the ledger `source` column and on-disk layer directories.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Cnpj => "cnpj",
            Source::Cvm => "cvm",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for every pipeline stage.
#[derive(Debug, Clone)]
pub struct EtlConfig {
    /// Root of the layered data directories (`raw/`, `bronze/`, `silver/`).
    pub data_dir: PathBuf,

    /// SQLite file holding the ingest ledger and warehouse tables.
    pub warehouse_path: PathBuf,

    /// Remote CNPJ directory-index root.
    pub cnpj_base_url: String,

    /// Remote CVM directory-index template with a `{doc}` placeholder.
    pub cvm_base_url_template: String,

    /// Timeout applied to each individual HTTP request.
    pub http_timeout_secs: u64,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            warehouse_path: PathBuf::from("data/warehouse.sqlite"),
            cnpj_base_url: DEFAULT_CNPJ_BASE_URL.to_string(),
            cvm_base_url_template: DEFAULT_CVM_BASE_URL_TEMPLATE.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl EtlConfig {
    /// Build a config from environment variables, falling back to defaults.
    ///
    /// Recognized variables: `GARIMPO_DATA_DIR`, `GARIMPO_WAREHOUSE`,
    /// `GARIMPO_CNPJ_URL`, `GARIMPO_CVM_URL`, `GARIMPO_HTTP_TIMEOUT`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("GARIMPO_DATA_DIR") {
            config.data_dir = PathBuf::from(&dir);
            config.warehouse_path = config.data_dir.join("warehouse.sqlite");
        }

        if let Ok(path) = std::env::var("GARIMPO_WAREHOUSE") {
            config.warehouse_path = PathBuf::from(path);
        }

        if let Ok(url) = std::env::var("GARIMPO_CNPJ_URL") {
            config.cnpj_base_url = url;
        }

        if let Ok(url) = std::env::var("GARIMPO_CVM_URL") {
            config.cvm_base_url_template = url;
        }

        if let Ok(timeout) = std::env::var("GARIMPO_HTTP_TIMEOUT") {
            if let Ok(secs) = timeout.parse() {
                config.http_timeout_secs = secs;
            }
        }

        config
    }

    /// Rooted at a single directory; warehouse lives alongside the layers.
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let data_dir = root.as_ref().to_path_buf();
        Self {
            warehouse_path: data_dir.join("warehouse.sqlite"),
            data_dir,
            ..Self::default()
        }
    }

    /// Raw download directory for a source.
    pub fn raw_dir(&self, source: Source) -> PathBuf {
        self.data_dir.join("raw").join(source.as_str())
    }

    /// Bronze (extracted) directory for a source.
    pub fn bronze_dir(&self, source: Source) -> PathBuf {
        self.data_dir.join("bronze").join(source.as_str())
    }

    /// Silver (normalized snapshot) directory for a source.
    pub fn silver_dir(&self, source: Source) -> PathBuf {
        self.data_dir.join("silver").join(source.as_str())
    }

    /// Resolved CVM listing URL for a document set (e.g. "itr" -> ITR).
    pub fn cvm_base_url(&self, doc: &str) -> String {
        self.cvm_base_url_template
            .replace("{doc}", &doc.trim().to_uppercase())
    }
}
