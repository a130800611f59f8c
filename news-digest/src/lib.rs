pub mod types;
pub mod traits;
pub mod rss_utils;
pub mod config;
pub mod cli;
pub mod fetcher;
pub mod parser;
pub mod aggregator;
pub mod llm_adapter;
pub mod summarizer;
pub mod throttle;
pub mod digest;
pub mod dump;
pub mod pipeline;

pub use types::*;
pub use traits::{CompletionService, FeedSource, Throttle};
pub use config::{load_columns, parse_columns, PipelineConfig};
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use aggregator::aggregate;
pub use llm_adapter::ChatCompletionAdapter;
pub use summarizer::Summarizer;
pub use throttle::{FixedDelay, NoThrottle};
pub use digest::{ComposeOutcome, DigestComposer};
pub use dump::DumpWriter;
pub use pipeline::{ColumnOutcome, ColumnReport, FeedReport, Pipeline, RunReport};
