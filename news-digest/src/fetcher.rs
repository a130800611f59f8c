use crate::parser::FeedParser;
use crate::traits::FeedSource;
use crate::types::{DigestError, FeedItem, FetchConfig, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    parser: FeedParser,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            client,
            parser: FeedParser::new(config.max_items_per_feed),
            config,
        })
    }

    /// Single GET of the feed document. One attempt, no conditional headers.
    pub async fn fetch_feed(&self, url: &str) -> Result<Vec<u8>> {
        let start_time = Instant::now();
        Url::parse(url)?;

        debug!("Fetching feed: {}", url);
        // Non-success statuses surface as `DigestError::Http`
        let response = self.client.get(url).send().await?.error_for_status()?;

        let max_bytes = self.config.max_feed_size_mb * 1024 * 1024;
        if let Some(content_length) = response.content_length() {
            if content_length as usize > max_bytes {
                return Err(DigestError::FeedTooLarge {
                    size_mb: content_length as usize / (1024 * 1024),
                });
            }
        }

        let bytes = response.bytes().await?;
        if bytes.len() > max_bytes {
            return Err(DigestError::FeedTooLarge {
                size_mb: bytes.len() / (1024 * 1024),
            });
        }

        info!(
            "Fetched feed: {} ({} bytes in {}ms)",
            url,
            bytes.len(),
            start_time.elapsed().as_millis()
        );
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl FeedSource for Fetcher {
    async fn fetch_items(&self, url: &str) -> Result<Vec<FeedItem>> {
        let content = self.fetch_feed(url).await?;
        self.parser.parse_feed(&content, url)
    }
}
