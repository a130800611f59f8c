use crate::aggregator::aggregate;
use crate::config::PipelineConfig;
use crate::digest::{link_key, ComposeOutcome, DigestComposer};
use crate::dump::DumpWriter;
use crate::fetcher::Fetcher;
use crate::llm_adapter::ChatCompletionAdapter;
use crate::summarizer::Summarizer;
use crate::throttle::FixedDelay;
use crate::traits::{CompletionService, FeedSource, Throttle};
use crate::types::{Column, DigestSection, Result, UnitStatus};
use chrono::{DateTime, Local};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct FeedReport {
    pub url: String,
    pub items: usize,
    pub status: UnitStatus,
}

#[derive(Debug, Clone)]
pub enum ColumnOutcome {
    /// No items survived fetch and dedup; nothing was written.
    Skipped,
    Written(ComposeOutcome),
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct ColumnReport {
    pub column: String,
    pub feeds: Vec<FeedReport>,
    pub aggregated: usize,
    pub dump: Option<UnitStatus>,
    pub dump_path: Option<PathBuf>,
    /// Items skipped because today's digest already has them.
    pub already_present: usize,
    pub summarized: usize,
    pub degraded: usize,
    pub outcome: ColumnOutcome,
}

impl ColumnReport {
    fn new(column: &str) -> Self {
        Self {
            column: column.to_string(),
            feeds: Vec::new(),
            aggregated: 0,
            dump: None,
            dump_path: None,
            already_present: 0,
            summarized: 0,
            degraded: 0,
            outcome: ColumnOutcome::Skipped,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, ColumnOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Local>,
    pub columns: Vec<ColumnReport>,
}

impl RunReport {
    pub fn failed_columns(&self) -> usize {
        self.columns.iter().filter(|c| c.is_failed()).count()
    }

    /// True when at least one column was attempted and every attempted
    /// column failed.
    pub fn all_failed(&self) -> bool {
        let attempted = self
            .columns
            .iter()
            .filter(|c| !matches!(c.outcome, ColumnOutcome::Skipped))
            .count();
        attempted > 0 && self.failed_columns() == attempted
    }
}

/// Drives fetch, aggregate, dump, summarize and compose, one column at a time.
pub struct Pipeline {
    source: Box<dyn FeedSource>,
    summarizer: Summarizer,
    throttle: Box<dyn Throttle>,
    composer: DigestComposer,
    dumper: DumpWriter,
}

impl Pipeline {
    pub fn new(
        source: Box<dyn FeedSource>,
        summarizer: Summarizer,
        throttle: Box<dyn Throttle>,
        composer: DigestComposer,
        dumper: DumpWriter,
    ) -> Self {
        Self {
            source,
            summarizer,
            throttle,
            composer,
            dumper,
        }
    }

    /// Wire the HTTP fetcher, the chat-completion adapter and a fixed-delay
    /// throttle from the run settings.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let fetcher = Fetcher::new(config.fetch.clone())?;
        let service = ChatCompletionAdapter::from_config(&config.summarizer)?
            .map(|adapter| Box::new(adapter) as Box<dyn CompletionService>);

        Ok(Self::new(
            Box::new(fetcher),
            Summarizer::new(service, config.summarizer.clone()),
            Box::new(FixedDelay::new(config.summary_delay)),
            DigestComposer::new(config.digest.clone()),
            DumpWriter::new(config.dump_dir.clone()),
        ))
    }

    pub async fn run(&mut self, columns: &[Column]) -> RunReport {
        self.run_at(columns, Local::now()).await
    }

    /// Process every column in order with `at` as the run time. One column's
    /// failure never stops the others.
    pub async fn run_at(&mut self, columns: &[Column], at: DateTime<Local>) -> RunReport {
        let run_id = Uuid::new_v4();
        info!("Run {} started for {} columns", run_id, columns.len());

        let mut reports = Vec::with_capacity(columns.len());
        for column in columns {
            let report = self.process_column(column, &at).await;
            match &report.outcome {
                ColumnOutcome::Skipped => warn!("{}: no usable items, skipped", column.name),
                ColumnOutcome::Written(outcome) => info!(
                    "{}: {} new articles in {} ({} degraded summaries)",
                    column.name,
                    outcome.sections_written(),
                    outcome.path().display(),
                    report.degraded
                ),
                ColumnOutcome::Failed { reason } => {
                    error!("{}: digest not written: {}", column.name, reason)
                }
            }
            reports.push(report);
        }

        RunReport {
            run_id,
            started_at: at,
            columns: reports,
        }
    }

    async fn process_column(&mut self, column: &Column, at: &DateTime<Local>) -> ColumnReport {
        info!("Processing column: {}", column.name);
        let mut report = ColumnReport::new(&column.name);

        let mut fetched = Vec::new();
        for url in &column.source_urls {
            match self.source.fetch_items(url).await {
                Ok(items) => {
                    report.feeds.push(FeedReport {
                        url: url.clone(),
                        items: items.len(),
                        status: UnitStatus::Ok,
                    });
                    fetched.extend(items);
                }
                Err(e) => {
                    warn!("Failed to fetch feed {}: {}", url, e);
                    report.feeds.push(FeedReport {
                        url: url.clone(),
                        items: 0,
                        status: UnitStatus::failed(e),
                    });
                }
            }
        }

        let set = aggregate(&column.name, fetched);
        report.aggregated = set.len();
        if set.is_empty() {
            return report;
        }

        match self.dumper.write(&set, at) {
            Ok(path) => {
                report.dump = Some(UnitStatus::Ok);
                report.dump_path = Some(path);
            }
            Err(e) => {
                error!("Failed to write dump for {}: {}", column.name, e);
                report.dump = Some(UnitStatus::failed(e));
            }
        }

        let known = match self.composer.known_links(&column.name, at) {
            Ok(known) => known,
            Err(e) => {
                report.outcome = ColumnOutcome::Failed {
                    reason: e.to_string(),
                };
                return report;
            }
        };

        let mut sections = Vec::with_capacity(set.len());
        for item in &set.items {
            if known.contains(&link_key(&item.link)) {
                debug!("Already in today's digest: {}", item.link);
                report.already_present += 1;
                continue;
            }

            if self.summarizer.has_service() {
                self.throttle.wait_turn().await;
            }
            let summary = self.summarizer.summarize(&column.name, item).await;
            report.summarized += 1;
            if summary.degraded {
                report.degraded += 1;
            }
            sections.push(DigestSection::new(item, summary));
        }

        report.outcome = match self.composer.compose(&column.name, at, &sections) {
            Ok(outcome) => ColumnOutcome::Written(outcome),
            Err(e) => ColumnOutcome::Failed {
                reason: e.to_string(),
            },
        };
        report
    }
}
