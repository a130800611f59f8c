mod common;

use async_trait::async_trait;
use common::{init_tracing, item, item_with_summary, rss_document, run_time, ScriptedService, StaticFeeds};
use news_digest::{
    Column, ColumnOutcome, CompletionService, DigestComposer, DigestConfig, DumpRecord, DumpWriter,
    FetchConfig, Fetcher, NoThrottle, Pipeline, Summarizer, SummarizerConfig, Throttle,
};
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn column(name: &str, urls: &[&str]) -> Column {
    Column {
        name: name.to_string(),
        source_urls: urls.iter().map(|u| u.to_string()).collect(),
    }
}

fn pipeline(dir: &TempDir, feeds: StaticFeeds, service: Option<ScriptedService>) -> Pipeline {
    pipeline_with_throttle(dir, feeds, service, Box::new(NoThrottle))
}

fn pipeline_with_throttle(
    dir: &TempDir,
    feeds: StaticFeeds,
    service: Option<ScriptedService>,
    throttle: Box<dyn Throttle>,
) -> Pipeline {
    let service = service.map(|s| Box::new(s) as Box<dyn CompletionService>);
    Pipeline::new(
        Box::new(feeds),
        Summarizer::new(service, SummarizerConfig::default()),
        throttle,
        DigestComposer::new(DigestConfig {
            news_dir: dir.path().join("_news"),
            ..DigestConfig::default()
        }),
        DumpWriter::new(dir.path().join("rss")),
    )
}

fn ai_feeds() -> StaticFeeds {
    StaticFeeds::new()
        .with_feed(
            "https://one.example.com/rss",
            vec![item("a", Some("2024-01-02")), item("b", Some("2024-01-01"))],
        )
        .with_feed(
            "https://two.example.com/rss",
            vec![item("a", Some("2024-01-02")), item("c", Some("2024-01-03"))],
        )
}

fn digest_path(dir: &TempDir, name: &str) -> std::path::PathBuf {
    dir.path().join("_news").join(name)
}

#[tokio::test]
async fn test_column_is_aggregated_summarized_and_written() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let service = ScriptedService::replying("Generated.");
    let mut pipeline = pipeline(&dir, ai_feeds(), Some(service.clone()));

    let report = pipeline
        .run_at(
            &[column("AI", &["https://one.example.com/rss", "https://two.example.com/rss"])],
            run_time(),
        )
        .await;

    let ai = &report.columns[0];
    assert_eq!(ai.aggregated, 3);
    assert_eq!(ai.summarized, 3);
    assert_eq!(ai.degraded, 0);
    assert!(matches!(ai.outcome, ColumnOutcome::Written(_)));
    assert_eq!(service.calls(), 3);

    let content = fs::read_to_string(digest_path(&dir, "2024-01-02-ai.md")).unwrap();
    let c = content.find("](c)").unwrap();
    let a = content.find("](a)").unwrap();
    let b = content.find("](b)").unwrap();
    assert!(c < a && a < b);
    assert_eq!(content.matches("Generated.").count(), 3);

    // Prompts follow aggregation order
    let prompts = service.prompts.lock().unwrap();
    assert!(prompts[0].contains("Link: c"));
    assert!(prompts[1].contains("Link: a"));
    assert!(prompts[2].contains("Link: b"));
}

#[tokio::test]
async fn test_dump_holds_aggregated_snapshots() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let mut pipeline = pipeline(&dir, ai_feeds(), None);

    let report = pipeline
        .run_at(
            &[column("AI", &["https://one.example.com/rss", "https://two.example.com/rss"])],
            run_time(),
        )
        .await;

    let dump_path = report.columns[0].dump_path.clone().unwrap();
    assert_eq!(dump_path, dir.path().join("rss").join("ai").join("2024-01-02-0930.json"));

    let record: DumpRecord = serde_json::from_str(&fs::read_to_string(&dump_path).unwrap()).unwrap();
    assert_eq!(record.column, "AI");
    assert_eq!(record.item_count, 3);
    let links: Vec<&str> = record.items.iter().map(|i| i.link.as_str()).collect();
    assert_eq!(links, vec!["c", "a", "b"]);

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&dump_path).unwrap()).unwrap();
    assert!(json.get("generatedAt").is_some());
    assert!(json.get("itemCount").is_some());
}

#[tokio::test]
async fn test_second_run_same_day_leaves_digest_untouched() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let columns = [column("AI", &["https://one.example.com/rss", "https://two.example.com/rss"])];

    let service = ScriptedService::replying("Generated.");
    pipeline(&dir, ai_feeds(), Some(service.clone()))
        .run_at(&columns, run_time())
        .await;
    let before = fs::read(digest_path(&dir, "2024-01-02-ai.md")).unwrap();

    let rerun_service = ScriptedService::replying("Different text.");
    let report = pipeline(&dir, ai_feeds(), Some(rerun_service.clone()))
        .run_at(&columns, run_time())
        .await;

    assert_eq!(fs::read(digest_path(&dir, "2024-01-02-ai.md")).unwrap(), before);
    assert_eq!(rerun_service.calls(), 0);
    assert_eq!(report.columns[0].already_present, 3);
    match &report.columns[0].outcome {
        ColumnOutcome::Written(outcome) => assert_eq!(outcome.sections_written(), 0),
        other => panic!("unexpected outcome {:?}", other),
    }

    // Each run keeps its own dump
    let dumps = fs::read_dir(dir.path().join("rss").join("ai")).unwrap().count();
    assert_eq!(dumps, 2);
}

#[tokio::test]
async fn test_only_new_article_is_appended() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let news_dir = dir.path().join("_news");
    fs::create_dir_all(&news_dir).unwrap();
    let existing = "---\ndate: 2024-01-02 08:00\n---\n\n# [A](a)\nAlready summarized.\n\n";
    fs::write(news_dir.join("2024-01-02-ai.md"), existing).unwrap();

    let feeds = StaticFeeds::new().with_feed(
        "https://one.example.com/rss",
        vec![item("a", Some("2024-01-02")), item("d", Some("2024-01-01"))],
    );
    let service = ScriptedService::replying("Summary of d.");
    let report = pipeline(&dir, feeds, Some(service.clone()))
        .run_at(&[column("AI", &["https://one.example.com/rss"])], run_time())
        .await;

    let content = fs::read_to_string(news_dir.join("2024-01-02-ai.md")).unwrap();
    assert!(content.starts_with(existing));
    assert_eq!(&content[existing.len()..], "# [Article d](d)\nSummary of d.\n\n");
    assert_eq!(service.calls(), 1);
    assert_eq!(report.columns[0].already_present, 1);
}

#[tokio::test]
async fn test_empty_column_is_skipped_without_output() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let feeds = StaticFeeds::new().with_feed("https://empty.example.com/rss", vec![item("", None)]);

    let report = pipeline(&dir, feeds, None)
        .run_at(
            &[column("Quiet", &["https://empty.example.com/rss", "https://down.example.com/rss"])],
            run_time(),
        )
        .await;

    let quiet = &report.columns[0];
    assert!(matches!(quiet.outcome, ColumnOutcome::Skipped));
    assert!(quiet.dump.is_none());
    assert!(!dir.path().join("_news").join("2024-01-02-quiet.md").exists());
    assert!(!dir.path().join("rss").join("quiet").exists());
    assert!(!report.all_failed());
}

#[tokio::test]
async fn test_failed_feed_does_not_stop_siblings_or_other_columns() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let feeds = StaticFeeds::new()
        .with_feed("https://ok.example.com/rss", vec![item("x", Some("2024-01-01"))])
        .with_feed("https://science.example.com/rss", vec![item("y", None)]);
    let requested = feeds.requested.clone();

    let report = pipeline(&dir, feeds, None)
        .run_at(
            &[
                column("Tech", &["https://down.example.com/rss", "https://ok.example.com/rss"]),
                column("Science", &["https://science.example.com/rss"]),
            ],
            run_time(),
        )
        .await;

    assert_eq!(
        *requested.lock().unwrap(),
        vec![
            "https://down.example.com/rss",
            "https://ok.example.com/rss",
            "https://science.example.com/rss"
        ]
    );
    let tech = &report.columns[0];
    assert!(!tech.feeds[0].status.is_ok());
    assert!(tech.feeds[1].status.is_ok());
    assert!(matches!(tech.outcome, ColumnOutcome::Written(_)));
    assert!(digest_path(&dir, "2024-01-02-tech.md").exists());
    assert!(digest_path(&dir, "2024-01-02-science.md").exists());
}

#[tokio::test]
async fn test_without_credential_every_summary_is_degraded() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let feeds = StaticFeeds::new().with_feed(
        "https://one.example.com/rss",
        vec![
            item_with_summary("a", Some("2024-01-02"), "Own text for a."),
            item("b", Some("2024-01-01")),
        ],
    );

    let report = pipeline(&dir, feeds, None)
        .run_at(&[column("AI", &["https://one.example.com/rss"])], run_time())
        .await;

    assert_eq!(report.columns[0].degraded, 2);
    let content = fs::read_to_string(digest_path(&dir, "2024-01-02-ai.md")).unwrap();
    assert!(content.contains("# [Article a](a)\nOwn text for a.\n\n"));
    assert!(content.contains("See the original article: b"));
}

#[tokio::test]
async fn test_unwritable_news_dir_fails_only_that_column() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    // A file where the news directory should be
    fs::write(dir.path().join("_news"), "not a directory").unwrap();

    let report = pipeline(&dir, ai_feeds(), None)
        .run_at(
            &[
                column("AI", &["https://one.example.com/rss"]),
                column("More", &["https://two.example.com/rss"]),
            ],
            run_time(),
        )
        .await;

    assert!(report.columns.iter().all(|c| c.is_failed()));
    assert_eq!(report.columns.len(), 2);
    assert!(report.all_failed());
    // Dumps are written before the digest step
    assert!(report.columns[0].dump.as_ref().unwrap().is_ok());
}

struct CountingThrottle {
    turns: Arc<Mutex<usize>>,
}

#[async_trait]
impl Throttle for CountingThrottle {
    async fn wait_turn(&mut self) {
        *self.turns.lock().unwrap() += 1;
    }
}

#[tokio::test]
async fn test_throttle_paces_only_service_calls() {
    init_tracing();
    let turns = Arc::new(Mutex::new(0));

    let dir = TempDir::new().unwrap();
    let throttle = Box::new(CountingThrottle { turns: turns.clone() });
    pipeline_with_throttle(&dir, ai_feeds(), Some(ScriptedService::replying("S.")), throttle)
        .run_at(&[column("AI", &["https://one.example.com/rss", "https://two.example.com/rss"])], run_time())
        .await;
    assert_eq!(*turns.lock().unwrap(), 3);

    let offline_dir = TempDir::new().unwrap();
    let offline_turns = Arc::new(Mutex::new(0));
    let throttle = Box::new(CountingThrottle { turns: offline_turns.clone() });
    pipeline_with_throttle(&offline_dir, ai_feeds(), None, throttle)
        .run_at(&[column("AI", &["https://one.example.com/rss"])], run_time())
        .await;
    assert_eq!(*offline_turns.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_http_fetcher_isolates_bad_feeds() {
    init_tracing();

    let mut server = mockito::Server::new_async().await;
    let _good = server
        .mock("GET", "/good.xml")
        .with_status(200)
        .with_header("content-type", "application/rss+xml")
        .with_body(rss_document(&[
            ("Newer", "https://news.example.com/2", "Wed, 03 Jan 2024 08:00:00 GMT", "Second story."),
            ("Older", "https://news.example.com/1", "Mon, 01 Jan 2024 08:00:00 GMT", "First story."),
        ]))
        .create_async()
        .await;
    let _broken = server
        .mock("GET", "/broken.xml")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;
    let _down = server
        .mock("GET", "/down.xml")
        .with_status(503)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
    let mut pipeline = Pipeline::new(
        Box::new(fetcher),
        Summarizer::offline(SummarizerConfig::default()),
        Box::new(NoThrottle),
        DigestComposer::new(DigestConfig {
            news_dir: dir.path().join("_news"),
            ..DigestConfig::default()
        }),
        DumpWriter::new(dir.path().join("rss")),
    );

    let urls = [
        format!("{}/down.xml", server.url()),
        format!("{}/broken.xml", server.url()),
        format!("{}/good.xml", server.url()),
    ];
    let url_refs: Vec<&str> = urls.iter().map(String::as_str).collect();
    let report = pipeline.run_at(&[column("News", &url_refs)], run_time()).await;

    let news = &report.columns[0];
    let statuses: Vec<bool> = news.feeds.iter().map(|f| f.status.is_ok()).collect();
    assert_eq!(statuses, vec![false, false, true]);
    assert_eq!(news.aggregated, 2);

    let content = fs::read_to_string(digest_path(&dir, "2024-01-02-news.md")).unwrap();
    let newer = content.find("https://news.example.com/2").unwrap();
    let older = content.find("https://news.example.com/1").unwrap();
    assert!(newer < older);
    assert!(content.contains("Second story."));
}
