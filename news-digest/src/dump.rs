use crate::rss_utils::slugify;
use crate::rss_utils::time::{file_date, hour_minute};
use crate::types::{AggregatedSet, DigestError, DumpRecord, Result};
use chrono::{DateTime, Local, Utc};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use tracing::info;

/// Writes one JSON snapshot of a column's aggregated items per run.
pub struct DumpWriter {
    root: PathBuf,
}

impl DumpWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/<slug>/<YYYY-MM-DD>-<HHmm>.json`. A numeric suffix is added when
    /// an earlier run in the same minute already used the name; existing dumps
    /// are never overwritten.
    pub fn write(&self, set: &AggregatedSet, at: &DateTime<Local>) -> Result<PathBuf> {
        let dir = self.root.join(slugify(&set.column));
        fs::create_dir_all(&dir).map_err(|e| DigestError::io(&dir, e))?;

        let record = DumpRecord::new(
            &set.column,
            at.with_timezone(&Utc),
            set.items.iter().map(|item| item.raw.clone()).collect(),
        );
        let json = serde_json::to_string_pretty(&record)?;

        let stem = format!("{}-{}", file_date(at), hour_minute(at));
        let mut attempt = 0usize;
        loop {
            let name = if attempt == 0 {
                format!("{}.json", stem)
            } else {
                format!("{}-{}.json", stem, attempt)
            };
            let path = dir.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(json.as_bytes())
                        .map_err(|e| DigestError::io(&path, e))?;
                    info!("Dumped {} items to {}", record.item_count, path.display());
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(DigestError::io(&path, e)),
            }
        }
    }
}
