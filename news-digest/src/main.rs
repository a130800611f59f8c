use anyhow::Context;
use news_digest::cli::Args;
use news_digest::{load_columns, ColumnOutcome, Pipeline};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse_args();
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }

    init_logging(args.verbose);
    info!("Starting news digest v{}", env!("CARGO_PKG_VERSION"));

    let config = args.to_pipeline_config();

    // Configuration problems stop the run before any feed is fetched
    let columns = load_columns(&args.config)
        .with_context(|| format!("Failed to load columns from {}", args.config.display()))?;
    let columns = config.select_columns(columns);
    if columns.is_empty() {
        warn!("No columns to process");
        return Ok(());
    }

    let mut pipeline = Pipeline::from_config(&config).context("Failed to build pipeline")?;
    let report = pipeline.run(&columns).await;

    info!("Run {} finished:", report.run_id);
    for column in &report.columns {
        let failed_feeds = column.feeds.iter().filter(|f| !f.status.is_ok()).count();
        let outcome = match &column.outcome {
            ColumnOutcome::Skipped => "skipped".to_string(),
            ColumnOutcome::Written(outcome) => format!(
                "{} new in {}",
                outcome.sections_written(),
                outcome.path().display()
            ),
            ColumnOutcome::Failed { reason } => format!("failed ({})", reason),
        };
        info!(
            "  {}: {} feeds ({} failed), {} items, {} summarized ({} degraded), {}",
            column.column,
            column.feeds.len(),
            failed_feeds,
            column.aggregated,
            column.summarized,
            column.degraded,
            outcome
        );
    }

    if report.all_failed() {
        error!("Every column failed to write its digest");
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
