#![allow(dead_code)]

// Shared fixtures for the integration tests
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use news_digest::{CompletionService, DigestError, FeedItem, FeedSource, RawEntry, Result};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// `YYYY-MM-DD` at midnight UTC, or `None` for an undated item.
pub fn item(link: &str, published: Option<&str>) -> FeedItem {
    let published_at = published.map(|day| {
        let (y, m, d) = parse_day(day);
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    });
    FeedItem {
        title: format!("Article {}", link),
        link: link.to_string(),
        published_at,
        raw_summary: String::new(),
        categories: BTreeSet::new(),
        raw: RawEntry {
            title: format!("Article {}", link),
            link: link.to_string(),
            published: published_at.map(|d| d.to_rfc3339()).unwrap_or_default(),
            ..RawEntry::default()
        },
    }
}

pub fn item_with_summary(link: &str, published: Option<&str>, summary: &str) -> FeedItem {
    let mut item = item(link, published);
    item.raw_summary = summary.to_string();
    item.raw.summary = summary.to_string();
    item
}

fn parse_day(day: &str) -> (i32, u32, u32) {
    let parts: Vec<&str> = day.split('-').collect();
    (
        parts[0].parse().unwrap(),
        parts[1].parse().unwrap(),
        parts[2].parse().unwrap(),
    )
}

/// A fixed local run time, 2024-01-02 09:30.
pub fn run_time() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap()
}

/// In-memory feeds keyed by URL; unknown URLs fail like an unreachable host.
#[derive(Clone, Default)]
pub struct StaticFeeds {
    feeds: HashMap<String, Vec<FeedItem>>,
    pub requested: Arc<Mutex<Vec<String>>>,
}

impl StaticFeeds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, url: &str, items: Vec<FeedItem>) -> Self {
        self.feeds.insert(url.to_string(), items);
        self
    }
}

#[async_trait]
impl FeedSource for StaticFeeds {
    async fn fetch_items(&self, url: &str) -> Result<Vec<FeedItem>> {
        self.requested.lock().unwrap().push(url.to_string());
        self.feeds
            .get(url)
            .cloned()
            .ok_or_else(|| DigestError::Parse(format!("unreachable: {}", url)))
    }
}

/// Completion service that answers from a script and records every prompt.
#[derive(Clone)]
pub struct ScriptedService {
    reply: std::result::Result<String, String>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedService {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            reply: Err(reason.to_string()),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionService for ScriptedService {
    fn service_name(&self) -> String {
        "scripted".to_string()
    }

    async fn complete(&self, _system: &str, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(DigestError::Service)
    }
}

/// Minimal RSS 2.0 document with `(title, link, pubDate, description)` items.
pub fn rss_document(items: &[(&str, &str, &str, &str)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
<channel>
<title>Test Feed</title>
<link>https://example.com/</link>
<description>Feed used in tests</description>
"#,
    );
    for (title, link, pub_date, description) in items {
        xml.push_str(&format!(
            "<item><title>{}</title><link>{}</link><pubDate>{}</pubDate><description>{}</description><category>Research</category></item>\n",
            title, link, pub_date, description
        ));
    }
    xml.push_str("</channel>\n</rss>\n");
    xml
}
