//! Remote endpoint access
//!
//! Both Receita Federal and CVM expose plain directory-index pages: an HTML
//! body full of anchor elements pointing at ZIP archives (and, for CNPJ,
//! monthly `YYYY-MM/` subdirectories). This module handles listing those
//! indexes, probing advertised file sizes, and streaming fetches to disk.

use crate::error::{EtlError, Result};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client wrapper with the pipeline's fixed per-request timeout.
pub struct RemoteClient {
    client: Client,
}

impl RemoteClient {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("garimpo-etl/0.1")
            .build()?;
        Ok(Self { client })
    }

    /// List remote filenames with the given suffix from a directory index.
    pub async fn list_files(&self, base_url: &str, suffix: &str) -> Result<Vec<String>> {
        let html = self.fetch_index(base_url).await?;
        Ok(parse_file_listing(&html, suffix))
    }

    /// List `YYYY-MM` subdirectories from a directory index (CNPJ only).
    pub async fn list_month_dirs(&self, base_url: &str) -> Result<Vec<String>> {
        let html = self.fetch_index(base_url).await?;
        Ok(parse_month_listing(&html))
    }

    async fn fetch_index(&self, url: &str) -> Result<String> {
        debug!(url = %url, "Fetching directory listing");
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(EtlError::HttpStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }
        Ok(response.text().await?)
    }

    /// Probe the remote file size via a HEAD request.
    ///
    /// Any failure on the probe (connection error, non-2xx status, absent or
    /// malformed content-length) degrades to `None`; callers fail open and
    /// re-download rather than trusting a possibly-stale local file.
    pub async fn content_length(&self, url: &str) -> Option<u64> {
        let response = match self.client.head(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(url = %url, error = %e, "Size probe failed");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(url = %url, status = %response.status(), "Size probe rejected");
            return None;
        }
        response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)?
            .to_str()
            .ok()?
            .parse()
            .ok()
    }

    /// Stream a remote file to `dest`, returning the byte count written.
    ///
    /// The destination is created fresh; a failed transfer may leave a
    /// partial file behind, which the next reconciliation pass will replace.
    pub async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(EtlError::HttpStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let total = response.content_length().unwrap_or(0);
        let pb = download_progress(total, dest);

        let mut file = std::fs::File::create(dest)?;
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)?;
            downloaded += chunk.len() as u64;
            pb.set_position(downloaded);
        }

        pb.finish_and_clear();
        Ok(downloaded)
    }
}

fn download_progress(total: u64, dest: &Path) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(
        dest.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
    );
    pb
}

/// Extract filenames ending in `suffix` from a directory-index HTML body.
///
/// Query strings are stripped; the result is sorted and deduplicated.
pub fn parse_file_listing(html: &str, suffix: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a").unwrap();
    let suffix_lower = suffix.to_lowercase();

    let mut files: Vec<String> = document
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| href.split('?').next().unwrap_or(href))
        .filter(|href| href.to_lowercase().ends_with(&suffix_lower))
        .map(str::to_string)
        .collect();
    files.sort();
    files.dedup();
    files
}

/// Extract `YYYY-MM` directory names from a directory-index HTML body.
///
/// Only hrefs ending in `/` whose stem fully matches the month pattern count;
/// the result is sorted and deduplicated.
pub fn parse_month_listing(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a").unwrap();
    let month = Regex::new(r"^\d{4}-\d{2}$").unwrap();

    let mut dirs: Vec<String> = document
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| href.split('?').next().unwrap_or(href))
        .filter(|href| href.ends_with('/'))
        .map(|href| href.trim_end_matches('/').to_string())
        .filter(|candidate| month.is_match(candidate))
        .collect();
    dirs.sort();
    dirs.dedup();
    dirs
}

/// Resolve the month directory to download from.
///
/// An explicit request must name an available month; otherwise the most
/// recent (lexicographically last, given the YYYY-MM shape) is used.
pub fn resolve_month(requested: Option<&str>, available: &[String]) -> Result<String> {
    let mut cleaned: Vec<String> = available
        .iter()
        .map(|m| m.trim().trim_end_matches('/').to_string())
        .collect();
    cleaned.sort();
    cleaned.dedup();

    if cleaned.is_empty() {
        return Err(EtlError::NoMonthsAvailable);
    }

    match requested {
        Some(month) => {
            let key = month.trim().trim_end_matches('/');
            if cleaned.iter().any(|m| m == key) {
                Ok(key.to_string())
            } else {
                Err(EtlError::MonthNotFound {
                    requested: month.to_string(),
                    available: cleaned.join(", "),
                })
            }
        }
        None => Ok(cleaned[cleaned.len() - 1].clone()),
    }
}

/// Filter candidate filenames by shell-glob patterns, then truncate.
///
/// Patterns combine with OR semantics. First-seen order is preserved while
/// duplicates (a name matching several patterns) are dropped, and the limit
/// applies after deduplication.
pub fn filter_by_patterns(
    files: &[String],
    patterns: &[String],
    limit: Option<usize>,
) -> Result<Vec<String>> {
    if files.is_empty() {
        return Ok(Vec::new());
    }

    let matched: Vec<&String> = if patterns.is_empty() {
        files.iter().collect()
    } else {
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            compiled.push(glob::Pattern::new(pattern).map_err(|source| EtlError::Pattern {
                pattern: pattern.clone(),
                source,
            })?);
        }
        let mut matched = Vec::new();
        for pattern in &compiled {
            matched.extend(files.iter().filter(|f| pattern.matches(f)));
        }
        matched
    };

    let mut seen = std::collections::HashSet::new();
    let mut ordered: Vec<String> = Vec::new();
    for name in matched {
        if seen.insert(name.as_str()) {
            ordered.push(name.clone());
        }
    }

    if let Some(limit) = limit {
        ordered.truncate(limit);
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX_HTML: &str = r##"
        <html><body>
        <a href="../">Parent</a>
        <a href="Empresas0.zip">Empresas0.zip</a>
        <a href="Empresas1.ZIP?ts=123">Empresas1.ZIP</a>
        <a href="Empresas0.zip">Empresas0.zip</a>
        <a href="leia-me.pdf">docs</a>
        <a href="2024-05/">2024-05/</a>
        <a href="2024-06/?sort=d">2024-06/</a>
        <a href="not-a-month/">other</a>
        <a href="2024-060/">bad</a>
        </body></html>
    "##;

    #[test]
    fn test_parse_file_listing_strips_queries_and_dedups() {
        let files = parse_file_listing(INDEX_HTML, ".zip");
        assert_eq!(files, vec!["Empresas0.zip", "Empresas1.ZIP"]);
    }

    #[test]
    fn test_parse_month_listing_matches_exact_pattern() {
        let dirs = parse_month_listing(INDEX_HTML);
        assert_eq!(dirs, vec!["2024-05", "2024-06"]);
    }

    #[test]
    fn test_resolve_month_defaults_to_latest() {
        let available = vec!["2024-05".to_string(), "2024-06".to_string()];
        assert_eq!(resolve_month(None, &available).unwrap(), "2024-06");
    }

    #[test]
    fn test_resolve_month_explicit() {
        let available = vec!["2024-05".to_string(), "2024-06".to_string()];
        assert_eq!(
            resolve_month(Some("2024-05"), &available).unwrap(),
            "2024-05"
        );
    }

    #[test]
    fn test_resolve_month_unknown_errors_with_options() {
        let available = vec!["2024-05".to_string()];
        let err = resolve_month(Some("2023-01"), &available).unwrap_err();
        assert!(matches!(err, EtlError::MonthNotFound { .. }));
        assert!(err.to_string().contains("2024-05"));
    }

    #[test]
    fn test_resolve_month_empty_listing() {
        assert!(matches!(
            resolve_month(None, &[]),
            Err(EtlError::NoMonthsAvailable)
        ));
    }

    #[test]
    fn test_filter_pattern_and_limit() {
        let files: Vec<String> = ["a.zip", "b.zip", "ab.zip", "c.zip"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let selected =
            filter_by_patterns(&files, &["a*".to_string()], Some(1)).unwrap();
        assert_eq!(selected, vec!["a.zip"]);
    }

    #[test]
    fn test_filter_overlapping_patterns_dedup_preserves_order() {
        let files: Vec<String> = ["a.zip", "b.zip", "ab.zip"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let selected =
            filter_by_patterns(&files, &["a*".to_string(), "*.zip".to_string()], None).unwrap();
        assert_eq!(selected, vec!["a.zip", "ab.zip", "b.zip"]);
    }

    #[test]
    fn test_filter_no_patterns_keeps_all() {
        let files: Vec<String> = ["a.zip", "b.zip"].iter().map(|s| s.to_string()).collect();
        assert_eq!(filter_by_patterns(&files, &[], None).unwrap(), files);
    }

    #[test]
    fn test_filter_invalid_pattern_errors() {
        let files = vec!["a.zip".to_string()];
        assert!(filter_by_patterns(&files, &["[".to_string()], None).is_err());
    }
}
