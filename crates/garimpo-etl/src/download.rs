//! Download reconciliation
//!
//! Decides, per candidate remote file, whether a fetch is needed at all. A
//! local file is trusted only when its byte size matches the size the remote
//! advertises; an unanswerable probe triggers a re-download rather than a
//! silent skip.

use crate::config::{EtlConfig, Source};
use crate::error::Result;
use crate::remote::{self, RemoteClient};
use std::path::Path;
use tracing::{error, info, warn};
use url::Url;

/// Outcome counters for one reconciliation batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadStats {
    /// Files actually transferred.
    pub fetched: usize,
    /// Files skipped because the local copy matched the remote size.
    pub skipped: usize,
    /// Files whose transfer failed; the batch continues past them.
    pub failed: usize,
}

/// Download Receita Federal CNPJ archives into `raw/cnpj`.
///
/// When `month` is omitted, the most recent available `YYYY-MM` directory is
/// used.
pub async fn download_cnpj(
    config: &EtlConfig,
    month: Option<&str>,
    patterns: &[String],
    limit: Option<usize>,
    overwrite: bool,
) -> Result<DownloadStats> {
    let dest_dir = config.raw_dir(Source::Cnpj);
    std::fs::create_dir_all(&dest_dir)?;

    let client = RemoteClient::new(config.http_timeout_secs)?;
    let months = client.list_month_dirs(&config.cnpj_base_url).await?;
    if months.is_empty() {
        warn!("No monthly directories found at Receita endpoint");
        return Ok(DownloadStats::default());
    }

    let month_key = remote::resolve_month(month, &months)?;
    let month_url = Url::parse(&config.cnpj_base_url)?.join(&format!("{month_key}/"))?;

    let files = client.list_files(month_url.as_str(), ".zip").await?;
    let to_fetch = remote::filter_by_patterns(&files, patterns, limit)?;
    if to_fetch.is_empty() {
        info!(month = %month_key, "No files matched the requested patterns");
        return Ok(DownloadStats::default());
    }

    info!(
        count = to_fetch.len(),
        month = %month_key,
        dest = %dest_dir.display(),
        "Downloading CNPJ archives"
    );
    download_many(&client, month_url.as_str(), &to_fetch, &dest_dir, overwrite).await
}

/// Download CVM open-data archives (ITR/DFP/...) into `raw/cvm`.
pub async fn download_cvm(
    config: &EtlConfig,
    doc: &str,
    patterns: &[String],
    limit: Option<usize>,
    overwrite: bool,
) -> Result<DownloadStats> {
    let dest_dir = config.raw_dir(Source::Cvm);
    std::fs::create_dir_all(&dest_dir)?;

    let base_url = config.cvm_base_url(doc);
    let client = RemoteClient::new(config.http_timeout_secs)?;
    let files = client.list_files(&base_url, ".zip").await?;
    let to_fetch = remote::filter_by_patterns(&files, patterns, limit)?;
    if to_fetch.is_empty() {
        info!(doc = %doc.trim().to_uppercase(), "No files matched the requested patterns");
        return Ok(DownloadStats::default());
    }

    info!(
        count = to_fetch.len(),
        doc = %doc.trim().to_uppercase(),
        dest = %dest_dir.display(),
        "Downloading CVM archives"
    );
    download_many(&client, &base_url, &to_fetch, &dest_dir, overwrite).await
}

/// Reconcile and fetch a batch of files from one remote directory.
///
/// A failed transfer aborts only that file; remaining candidates still run.
pub async fn download_many(
    client: &RemoteClient,
    base_url: &str,
    filenames: &[String],
    dest_dir: &Path,
    overwrite: bool,
) -> Result<DownloadStats> {
    let base = Url::parse(base_url)?;
    let mut stats = DownloadStats::default();

    for name in filenames {
        let dest = dest_dir.join(name);
        let url = base.join(name)?;

        if dest.exists() && !overwrite {
            let local_size = std::fs::metadata(&dest)?.len();
            match client.content_length(url.as_str()).await {
                Some(remote_size) if remote_size == local_size => {
                    info!(file = %dest.display(), "Skipping existing file");
                    stats.skipped += 1;
                    continue;
                }
                Some(remote_size) => {
                    info!(
                        file = %dest.display(),
                        local_size,
                        remote_size,
                        "Re-downloading: size mismatch"
                    );
                }
                None => {
                    warn!(
                        file = %dest.display(),
                        local_size,
                        "Re-downloading: remote size unknown"
                    );
                }
            }
        }

        info!(url = %url, "GET");
        match client.fetch_to_file(url.as_str(), &dest).await {
            Ok(bytes) => {
                info!(file = %dest.display(), bytes, "Downloaded");
                stats.fetched += 1;
            }
            Err(e) => {
                error!(url = %url, error = %e, "Download failed");
                stats.failed += 1;
            }
        }
    }

    if stats.failed > 0 {
        warn!(failed = stats.failed, "Some downloads failed; re-run to retry");
    }
    Ok(stats)
}
