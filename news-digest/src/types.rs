use std::path::PathBuf;

// Use the interfaces crate for the data handed between stages
pub use interfaces::defs::{
    AggregatedSet, Column, DigestSection, DumpRecord, FeedItem, FrontMatter, RawEntry, Summary,
    UnitStatus,
};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_items_per_feed: usize,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "catchnews-bot/1.0".to_string(),
            timeout_seconds: 15,
            max_items_per_feed: 5,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// No key means every summary is produced by the local fallback.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    pub language: String,
    pub snippet_chars: usize,
    pub fallback_chars: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.siliconflow.cn/v1".to_string(),
            model: "Qwen/Qwen3-8B".to_string(),
            temperature: 0.3,
            max_tokens: 800,
            timeout_seconds: 60,
            language: "English".to_string(),
            snippet_chars: 800,
            fallback_chars: 280,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DigestConfig {
    pub news_dir: PathBuf,
    pub author: Option<String>,
    /// Put the column name in the front matter `title` field.
    pub with_title: bool,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            news_dir: PathBuf::from("_news"),
            author: None,
            with_title: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Feed size exceeds limit: {size_mb}MB")]
    FeedTooLarge { size_mb: usize },

    #[error("Summarization service error: {0}")]
    Service(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DigestError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DigestError>;
