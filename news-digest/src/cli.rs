//! Command-line interface argument parsing.

use crate::config::PipelineConfig;
use crate::types::{DigestConfig, FetchConfig, SummarizerConfig};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Fetch RSS feeds per column, summarize every article and write dated
/// Markdown digests plus a raw JSON dump of what was fetched.
///
/// Examples:
///   news-digest --config main/rss.json
///   SILICONFLOW_API_KEY=sk-... news-digest --only AI --summary-delay-ms 5000
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Column file: a JSON object mapping column names to feed URL arrays
    #[arg(short, long, default_value = "main/rss.json", value_name = "FILE")]
    pub config: PathBuf,

    /// Directory that receives `<date>-<slug>.md` digests
    #[arg(long, default_value = "_news", value_name = "DIR")]
    pub news_dir: PathBuf,

    /// Directory that receives `<slug>/<date>-<HHmm>.json` dumps
    #[arg(long, default_value = "rss", value_name = "DIR")]
    pub dump_dir: PathBuf,

    /// Entries taken from the top of each feed
    #[arg(long, default_value = "5", env = "MAX_ITEMS_PER_FEED", value_name = "COUNT")]
    pub max_items_per_feed: usize,

    /// Timeout for each feed request
    #[arg(long, default_value = "15", value_name = "SECONDS")]
    pub fetch_timeout_secs: u64,

    /// User agent sent with feed requests
    #[arg(long, default_value = "catchnews-bot/1.0")]
    pub user_agent: String,

    /// Bearer key for the summarization service. Without it every summary
    /// uses the local fallback.
    #[arg(long, env = "SILICONFLOW_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the chat-completion API
    #[arg(long, default_value = "https://api.siliconflow.cn/v1", env = "SILICONFLOW_BASE_URL")]
    pub base_url: String,

    /// Model identifier sent to the summarization service
    #[arg(long, default_value = "Qwen/Qwen3-8B", env = "SILICONFLOW_MODEL")]
    pub model: String,

    /// Sampling temperature for summaries
    #[arg(long, default_value = "0.3")]
    pub temperature: f32,

    /// Upper bound on generated tokens per summary
    #[arg(long, default_value = "800")]
    pub max_tokens: u32,

    /// Timeout for each summarization request
    #[arg(long, default_value = "60", value_name = "SECONDS")]
    pub summary_timeout_secs: u64,

    /// Pause between consecutive summarization requests
    #[arg(long, default_value = "2000", value_name = "MILLIS")]
    pub summary_delay_ms: u64,

    /// Language the summaries are written in
    #[arg(long, default_value = "English")]
    pub language: String,

    /// Author written into the front matter of new digests
    #[arg(long)]
    pub author: Option<String>,

    /// Write the column name as the front matter title of new digests
    #[arg(long)]
    pub with_title: bool,

    /// Only process these columns (repeatable)
    #[arg(long = "only", value_name = "COLUMN")]
    pub only: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_items_per_feed == 0 {
            return Err("--max-items-per-feed must be at least 1".to_string());
        }
        if self.fetch_timeout_secs == 0 || self.summary_timeout_secs == 0 {
            return Err("timeouts must be at least 1 second".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("--temperature must be between 0.0 and 2.0".to_string());
        }
        Ok(())
    }

    pub fn to_pipeline_config(&self) -> PipelineConfig {
        let defaults = SummarizerConfig::default();

        PipelineConfig {
            fetch: FetchConfig {
                user_agent: self.user_agent.clone(),
                timeout_seconds: self.fetch_timeout_secs,
                max_items_per_feed: self.max_items_per_feed,
                ..FetchConfig::default()
            },
            summarizer: SummarizerConfig {
                api_key: self.api_key.clone(),
                base_url: self.base_url.clone(),
                model: self.model.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                timeout_seconds: self.summary_timeout_secs,
                language: self.language.clone(),
                ..defaults
            },
            digest: DigestConfig {
                news_dir: self.news_dir.clone(),
                author: self.author.clone(),
                with_title: self.with_title,
            },
            dump_dir: self.dump_dir.clone(),
            summary_delay: Duration::from_millis(self.summary_delay_ms),
            only_columns: self.only.clone(),
        }
    }
}
