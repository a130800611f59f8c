use crate::rss_utils::text::{collapse_whitespace, strip_html};
use crate::types::{DigestError, FeedItem, RawEntry, Result};
use chrono::{DateTime, Utc};
use feed_rs::parser;
use std::collections::BTreeSet;
use tracing::debug;

pub struct FeedParser {
    max_items: usize,
}

impl FeedParser {
    pub fn new(max_items: usize) -> Self {
        Self { max_items }
    }

    /// Parse RSS/Atom bytes into at most `max_items` normalized items, keeping
    /// the feed's own ordering.
    pub fn parse_feed(&self, content: &[u8], feed_url: &str) -> Result<Vec<FeedItem>> {
        debug!("Parsing feed content ({} bytes) from {}", content.len(), feed_url);

        let feed = parser::parse(content)
            .map_err(|e| DigestError::Parse(format!("Failed to parse feed {}: {}", feed_url, e)))?;

        let total = feed.entries.len();
        let items: Vec<FeedItem> = feed
            .entries
            .into_iter()
            .take(self.max_items)
            .map(|entry| Self::normalize_entry(entry, feed_url))
            .collect();

        debug!("Kept {} of {} entries from {}", items.len(), total, feed_url);
        Ok(items)
    }

    fn normalize_entry(entry: feed_rs::model::Entry, feed_url: &str) -> FeedItem {
        let raw = Self::snapshot(&entry, feed_url);

        let title = collapse_whitespace(&raw.title);
        let link = raw.link.trim().to_string();

        // Prefer the publish date, fall back to the last update
        let published_at: Option<DateTime<Utc>> = entry.published.or(entry.updated);

        let summary_source = if raw.summary.trim().is_empty() {
            &raw.content
        } else {
            &raw.summary
        };
        let raw_summary = collapse_whitespace(&strip_html(summary_source));

        let categories: BTreeSet<String> = raw
            .categories
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();

        FeedItem {
            title,
            link,
            published_at,
            raw_summary,
            categories,
            raw,
        }
    }

    fn snapshot(entry: &feed_rs::model::Entry, feed_url: &str) -> RawEntry {
        RawEntry {
            guid: entry.id.clone(),
            title: entry.title.as_ref().map(|t| t.content.clone()).unwrap_or_default(),
            link: entry.links.first().map(|l| l.href.clone()).unwrap_or_default(),
            published: entry.published.map(|d| d.to_rfc3339()).unwrap_or_default(),
            updated: entry.updated.map(|d| d.to_rfc3339()).unwrap_or_default(),
            summary: entry.summary.as_ref().map(|s| s.content.clone()).unwrap_or_default(),
            content: entry
                .content
                .as_ref()
                .and_then(|c| c.body.clone())
                .unwrap_or_default(),
            categories: entry.categories.iter().map(|c| c.term.clone()).collect(),
            authors: entry.authors.iter().map(|a| a.name.clone()).collect(),
            feed_url: feed_url.to_string(),
        }
    }
}
