use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named group of feeds that share one digest file per day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub source_urls: Vec<String>,
}

/// Everything the feed parser exposed for one entry, kept for the JSON dump.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    pub guid: String,
    pub title: String,
    pub link: String,
    pub published: String,
    pub updated: String,
    pub summary: String,
    pub content: String,
    pub categories: Vec<String>,
    pub authors: Vec<String>,
    pub feed_url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
    pub raw_summary: String,
    pub categories: BTreeSet<String>,
    pub raw: RawEntry,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AggregatedSet {
    pub column: String,
    pub items: Vec<FeedItem>,
}

impl AggregatedSet {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    pub for_link: String,
    pub text: String,
    /// Set when the text came from the local fallback instead of the service.
    pub degraded: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DigestSection {
    pub title: String,
    pub link: String,
    pub summary_text: String,
}

impl DigestSection {
    pub fn new(item: &FeedItem, summary: Summary) -> Self {
        Self {
            title: item.title.clone(),
            link: item.link.clone(),
            summary_text: summary.text,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrontMatter {
    /// `YYYY-MM-DD HH:mm` in local time.
    pub date: String,
    pub title: Option<String>,
    pub author: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DumpRecord {
    pub column: String,
    pub generated_at: DateTime<Utc>,
    pub item_count: usize,
    pub items: Vec<RawEntry>,
}

impl DumpRecord {
    pub fn new(column: &str, generated_at: DateTime<Utc>, items: Vec<RawEntry>) -> Self {
        Self {
            column: column.to_owned(),
            generated_at,
            item_count: items.len(),
            items,
        }
    }
}

/// Result of one unit of work (a feed fetch, a dump write, ...) as seen by
/// the orchestrator. Failures carry a printable reason instead of an error
/// value so reports can be cloned and logged freely.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnitStatus {
    Ok,
    Failed { reason: String },
}

impl UnitStatus {
    pub fn failed(reason: impl ToString) -> Self {
        Self::Failed { reason: reason.to_string() }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

// Object style note:
// Values in this module are plain data handed between pipeline stages.
// They are built once by the stage that owns them (the fetcher builds
// FeedItem, the summarizer builds Summary) and never mutated afterwards.
