use crate::types::{FeedItem, Result};
use async_trait::async_trait;

/// Anything that can turn a feed URL into normalized items.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch one feed. Errors are scoped to this URL; the caller decides
    /// whether the rest of the column continues.
    async fn fetch_items(&self, url: &str) -> Result<Vec<FeedItem>>;
}

/// A chat-completion style text generator.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Human-readable name for logs
    fn service_name(&self) -> String;

    /// Send a system instruction plus one user prompt, return the raw reply text.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

/// Spacing policy between consecutive calls to the summarization service.
#[async_trait]
pub trait Throttle: Send {
    /// Block until the next call may start.
    async fn wait_turn(&mut self);
}
