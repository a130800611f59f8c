use crate::rss_utils::text::{collapse_whitespace, strip_reasoning, truncate_chars};
use crate::traits::CompletionService;
use crate::types::{DigestError, FeedItem, Result, Summary, SummarizerConfig};
use chrono::SecondsFormat;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "You are a careful news editor and summarization assistant.";

/// Produces one summary per item, falling back to local text when the
/// service is missing or fails.
pub struct Summarizer {
    service: Option<Box<dyn CompletionService>>,
    config: SummarizerConfig,
}

impl Summarizer {
    pub fn new(service: Option<Box<dyn CompletionService>>, config: SummarizerConfig) -> Self {
        match &service {
            Some(service) => debug!("Summarizer using {}", service.service_name()),
            None => warn!("No summarization API key configured, using local fallback summaries"),
        }
        Self { service, config }
    }

    /// Fallback-only summarizer.
    pub fn offline(config: SummarizerConfig) -> Self {
        Self::new(None, config)
    }

    /// Whether calls will reach the external service.
    pub fn has_service(&self) -> bool {
        self.service.is_some()
    }

    pub fn build_prompt(&self, column: &str, item: &FeedItem) -> String {
        let mut material = vec![format!("Title: {}", item.title)];
        if !item.link.is_empty() {
            material.push(format!("Link: {}", item.link));
        }
        if let Some(published_at) = item.published_at {
            material.push(format!(
                "Published: {}",
                published_at.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }
        if !item.raw_summary.trim().is_empty() {
            let snippet = truncate_chars(
                &collapse_whitespace(&item.raw_summary),
                self.config.snippet_chars,
            );
            material.push(format!("Excerpt: {}", snippet));
        }

        format!(
            "You are a senior technology editor writing a single-article summary for the column \"{column}\".\n\n\
             Guidelines:\n\
             - Write 3-5 sentences in {language} covering the core finding or event, how it was done or why it matters, and its likely impact.\n\
             - Be accurate and concise, do not exaggerate, do not repeat the title, do not output list markers or links.\n\
             - Write for non-specialist readers; add one sentence of background when needed.\n\n\
             Material:\n{material}",
            column = column,
            language = self.config.language,
            material = material.join("\n"),
        )
    }

    /// Never fails: every error turns into a degraded summary.
    pub async fn summarize(&self, column: &str, item: &FeedItem) -> Summary {
        match self.request_summary(column, item).await {
            Ok(text) => Summary {
                for_link: item.link.clone(),
                text,
                degraded: false,
            },
            Err(e) => {
                if self.has_service() {
                    warn!("Summary failed for {} ({}), using fallback: {}", item.link, item.title, e);
                } else {
                    debug!("Fallback summary for {}", item.link);
                }
                self.fallback(item)
            }
        }
    }

    async fn request_summary(&self, column: &str, item: &FeedItem) -> Result<String> {
        let service = self
            .service
            .as_ref()
            .ok_or_else(|| DigestError::Service("no API key configured".to_string()))?;

        let prompt = self.build_prompt(column, item);
        let reply = service.complete(SYSTEM_PROMPT, &prompt).await?;

        let text = strip_reasoning(&reply);
        if text.is_empty() {
            return Err(DigestError::Service("empty completion".to_string()));
        }
        Ok(text)
    }

    /// Local summary: a prefix of the item's own summary, or a pointer to
    /// the article when it has none.
    pub fn fallback(&self, item: &FeedItem) -> Summary {
        let own = collapse_whitespace(&item.raw_summary);
        let text = if own.is_empty() {
            format!("See the original article: {}", item.link)
        } else {
            truncate_chars(&own, self.config.fallback_chars)
        };

        Summary {
            for_link: item.link.clone(),
            text,
            degraded: true,
        }
    }
}
