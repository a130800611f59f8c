//! Column file loading and the settings threaded into each pipeline stage.

use crate::rss_utils::url::is_valid_rss_url;
use crate::types::{Column, DigestConfig, DigestError, FetchConfig, Result, SummarizerConfig};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Everything a run needs, built once in `main`.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub fetch: FetchConfig,
    pub summarizer: SummarizerConfig,
    pub digest: DigestConfig,
    pub dump_dir: PathBuf,
    /// Spacing between consecutive summarization calls.
    pub summary_delay: Duration,
    /// Restrict the run to these column names. Empty means all columns.
    pub only_columns: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            summarizer: SummarizerConfig::default(),
            digest: DigestConfig::default(),
            dump_dir: PathBuf::from("rss"),
            summary_delay: Duration::from_millis(2000),
            only_columns: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Apply the `only_columns` filter, keeping configuration order.
    pub fn select_columns(&self, columns: Vec<Column>) -> Vec<Column> {
        if self.only_columns.is_empty() {
            return columns;
        }
        columns
            .into_iter()
            .filter(|column| self.only_columns.iter().any(|name| name == &column.name))
            .collect()
    }
}

/// Load `{ "<column>": ["<feed url>", ...] }` from a JSON file.
pub fn load_columns(path: &Path) -> Result<Vec<Column>> {
    let raw = std::fs::read_to_string(path).map_err(|e| DigestError::io(path, e))?;
    parse_columns(&raw).map_err(|e| match e {
        DigestError::Config(reason) => {
            DigestError::Config(format!("{}: {}", path.display(), reason))
        }
        other => other,
    })
}

/// Parse the column mapping, preserving key order. URLs that are not
/// http(s) are skipped with a warning.
pub fn parse_columns(raw: &str) -> Result<Vec<Column>> {
    let mapping: Map<String, Value> = serde_json::from_str(raw)
        .map_err(|e| DigestError::Config(format!("expected a JSON object of columns: {}", e)))?;

    let mut columns = Vec::with_capacity(mapping.len());
    for (name, value) in mapping {
        let entries = value.as_array().ok_or_else(|| {
            DigestError::Config(format!("column \"{}\" must map to an array of URLs", name))
        })?;

        let mut source_urls = Vec::with_capacity(entries.len());
        for entry in entries {
            let url = entry.as_str().ok_or_else(|| {
                DigestError::Config(format!("column \"{}\" has a non-string URL: {}", name, entry))
            })?;
            let url = url.trim();
            if is_valid_rss_url(url) {
                source_urls.push(url.to_string());
            } else {
                warn!("Skipping invalid feed URL in column {}: {}", name, url);
            }
        }

        debug!("Column {}: {} feeds", name, source_urls.len());
        columns.push(Column { name, source_urls });
    }

    Ok(columns)
}
