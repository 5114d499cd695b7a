//! End-to-end search runs against mock capabilities
//!
//! These tests drive `run_search` with a scripted discovery source and a
//! canned page graph, persisting into a real SQLite database in a temp
//! directory, and assert the terminal status and stored records.

use async_trait::async_trait;
use leadtrawl::config::{
    Config, CrawlerConfig, DiscoveryConfig, ExtractionConfig, FetchConfig, StorageConfig,
    UserAgentConfig,
};
use leadtrawl::crawl::capabilities::{
    Discovery, DiscoveryError, FetchError, ListingSearch, PageContacts, PageFetcher,
    ResultCallback, StopCheck,
};
use leadtrawl::crawl::{run_search, RunCapabilities, RunOptions, SearchMode, SharedStore};
use leadtrawl::storage::{BusinessRecord, SearchStatus, SearchStore, SqliteStorage};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Discovery that streams a fixed list of URLs
struct FixedSeeds(Vec<String>);

#[async_trait]
impl Discovery for FixedSeeds {
    async fn search(
        &self,
        _query: &str,
        max_results: usize,
        on_result: ResultCallback<'_>,
        should_stop: StopCheck<'_>,
    ) -> Result<(), DiscoveryError> {
        for url in self.0.iter().take(max_results) {
            if should_stop() {
                return Ok(());
            }
            on_result(url.clone());
        }
        Ok(())
    }
}

/// Discovery that never yields anything until cancelled
struct BlockedDiscovery;

#[async_trait]
impl Discovery for BlockedDiscovery {
    async fn search(
        &self,
        _query: &str,
        _max_results: usize,
        _on_result: ResultCallback<'_>,
        should_stop: StopCheck<'_>,
    ) -> Result<(), DiscoveryError> {
        while !should_stop() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Ok(())
    }
}

/// Fetcher backed by a canned link graph; unknown URLs return 404
#[derive(Default)]
struct GraphFetcher {
    pages: HashMap<String, PageContacts>,
}

impl GraphFetcher {
    fn page(mut self, url: &str, emails: &[&str], links: &[&str]) -> Self {
        self.pages.insert(
            url.to_string(),
            PageContacts {
                emails: emails.iter().map(|s| s.to_string()).collect(),
                phones: Vec::new(),
                links: links.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }
}

#[async_trait]
impl PageFetcher for GraphFetcher {
    async fn fetch(&self, url: &str) -> Result<PageContacts, FetchError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or(FetchError::Status(404))
    }
}

struct FixedListing(Vec<BusinessRecord>);

#[async_trait]
impl ListingSearch for FixedListing {
    async fn search_listings(
        &self,
        _query: &str,
        _page_count: u32,
    ) -> Result<Vec<BusinessRecord>, DiscoveryError> {
        Ok(self.0.clone())
    }
}

fn test_config(db_path: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_depth: 1,
            max_pages: 100,
            max_workers: 4,
            max_external_links: 5,
            status_interval: 5,
            idle_poll_ms: 10,
            worker_poll_ms: 50,
        },
        fetch: FetchConfig {
            request_delay_ms: 0,
            request_timeout_secs: 5,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestTrawl".to_string(),
            crawler_version: "0.0.0".to_string(),
            contact_url: "https://trawl.test/about".to_string(),
            contact_email: "crawler@trawl.test".to_string(),
        },
        storage: StorageConfig {
            database_path: db_path.to_string(),
        },
        discovery: DiscoveryConfig {
            engine: "duckduckgo".to_string(),
            max_search_results: 20,
            listing_page_count: 1,
        },
        extraction: ExtractionConfig::default(),
    }
}

struct TestRun {
    _dir: TempDir,
    db_path: String,
    config: Config,
    store: SharedStore,
}

fn setup() -> TestRun {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir
        .path()
        .join("trawl.db")
        .to_string_lossy()
        .into_owned();
    let config = test_config(&db_path);
    let storage = SqliteStorage::new(Path::new(&db_path)).expect("Failed to open DB");
    let store: SharedStore = Arc::new(Mutex::new(storage));
    TestRun {
        _dir: dir,
        db_path,
        config,
        store,
    }
}

fn caps(
    discovery: impl Discovery + 'static,
    fetcher: impl PageFetcher + 'static,
) -> RunCapabilities {
    RunCapabilities {
        discovery: Arc::new(discovery),
        fetcher: Arc::new(fetcher),
        listing: None,
    }
}

#[tokio::test]
async fn test_web_run_crawls_discovered_seeds() {
    let run = setup();

    let discovery = FixedSeeds(vec!["https://a.test/".to_string()]);
    let fetcher = GraphFetcher::default()
        .page(
            "https://a.test/",
            &["info@a.test"],
            &["https://a.test/contact", "https://b.test/"],
        )
        .page("https://a.test/contact", &["sales@a.test"], &[])
        .page("https://b.test/", &["hello@b.test"], &[]);

    let summary = run_search(
        &run.config,
        Arc::clone(&run.store),
        caps(discovery, fetcher),
        "a test query",
        SearchMode::WebDiscovery,
        RunOptions::default(),
    )
    .await
    .expect("Run failed");

    assert_eq!(summary.status, SearchStatus::Completed);
    assert_eq!(summary.pages_crawled, 3);
    assert_eq!(summary.records_found, 3);

    let store = run.store.lock().unwrap();
    let emails = store.get_emails(summary.search_id).unwrap();
    let mut found: Vec<&str> = emails.iter().map(|e| e.email.as_str()).collect();
    found.sort();
    assert_eq!(found, vec!["hello@b.test", "info@a.test", "sales@a.test"]);

    let record = store.get_search(summary.search_id).unwrap();
    assert!(record.completed_at.is_some());
    assert!(record.current_url.is_none());
}

#[tokio::test]
async fn test_page_limit_with_many_seeds() {
    let run = setup();
    let mut config = run.config.clone();
    config.crawler.max_pages = 1;

    let seeds: Vec<String> = (0..5).map(|i| format!("https://s{}.test/", i)).collect();
    let mut fetcher = GraphFetcher::default();
    for seed in &seeds {
        fetcher = fetcher.page(seed, &[], &[]);
    }

    let summary = run_search(
        &config,
        Arc::clone(&run.store),
        caps(FixedSeeds(seeds), fetcher),
        "query",
        SearchMode::WebDiscovery,
        RunOptions::default(),
    )
    .await
    .expect("Run failed");

    assert_eq!(summary.status, SearchStatus::Completed);
    assert_eq!(summary.pages_crawled, 1);
}

#[tokio::test]
async fn test_external_stop_before_any_seed() {
    let run = setup();
    let db_path = run.db_path.clone();

    // A second connection plays the role of another process requesting stop
    let stopper = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let mut other = SqliteStorage::new(Path::new(&db_path)).expect("Failed to open DB");
        other
            .update_search_status(1, SearchStatus::Stopped, None, None, None, None)
            .expect("Failed to request stop");
    });

    let summary = run_search(
        &run.config,
        Arc::clone(&run.store),
        caps(BlockedDiscovery, GraphFetcher::default()),
        "query",
        SearchMode::WebDiscovery,
        RunOptions::default(),
    )
    .await
    .expect("Run failed");
    stopper.await.unwrap();

    assert_eq!(summary.search_id, 1);
    assert_eq!(summary.status, SearchStatus::Stopped);
    assert_eq!(summary.pages_crawled, 0);
}

/// Discovery whose task dies without returning
struct PanickingDiscovery;

#[async_trait]
impl Discovery for PanickingDiscovery {
    async fn search(
        &self,
        _query: &str,
        _max_results: usize,
        _on_result: ResultCallback<'_>,
        _should_stop: StopCheck<'_>,
    ) -> Result<(), DiscoveryError> {
        panic!("discovery backend blew up");
    }
}

#[tokio::test]
async fn test_discovery_panic_still_terminates_run() {
    let run = setup();

    let summary = tokio::time::timeout(
        Duration::from_secs(5),
        run_search(
            &run.config,
            Arc::clone(&run.store),
            caps(PanickingDiscovery, GraphFetcher::default()),
            "a query with spaces",
            SearchMode::WebDiscovery,
            RunOptions::default(),
        ),
    )
    .await
    .expect("Run hung after the discovery task died")
    .expect("Run failed");

    assert_eq!(summary.status, SearchStatus::Completed);
    assert_eq!(summary.pages_crawled, 0);
}

#[tokio::test]
async fn test_zero_seeds_completes_without_error() {
    let run = setup();

    let summary = run_search(
        &run.config,
        Arc::clone(&run.store),
        caps(FixedSeeds(Vec::new()), GraphFetcher::default()),
        "a query with no results",
        SearchMode::WebDiscovery,
        RunOptions::default(),
    )
    .await
    .expect("Run failed");

    assert_eq!(summary.status, SearchStatus::Completed);
    assert_eq!(summary.pages_crawled, 0);
    assert_eq!(summary.message.as_deref(), Some("no relevant sources found"));

    let store = run.store.lock().unwrap();
    let record = store.get_search(summary.search_id).unwrap();
    assert!(record.error_message.is_none());
}

#[tokio::test]
async fn test_direct_mode_crawls_given_url() {
    let run = setup();

    let fetcher = GraphFetcher::default().page("https://a.test/", &["info@a.test"], &[]);
    let summary = run_search(
        &run.config,
        Arc::clone(&run.store),
        caps(FixedSeeds(Vec::new()), fetcher),
        "https://a.test/",
        SearchMode::DirectCrawl,
        RunOptions::default(),
    )
    .await
    .expect("Run failed");

    assert_eq!(summary.status, SearchStatus::Completed);
    assert_eq!(summary.pages_crawled, 1);
    assert_eq!(summary.records_found, 1);
}

#[tokio::test]
async fn test_direct_mode_accepts_bare_domain() {
    let run = setup();

    let fetcher = GraphFetcher::default().page("https://a.test/", &["info@a.test"], &[]);
    let summary = run_search(
        &run.config,
        Arc::clone(&run.store),
        caps(FixedSeeds(Vec::new()), fetcher),
        "a.test",
        SearchMode::DirectCrawl,
        RunOptions::default(),
    )
    .await
    .expect("Run failed");

    assert_eq!(summary.status, SearchStatus::Completed);
    assert_eq!(summary.pages_crawled, 1);
    assert_eq!(summary.records_found, 1);
}

#[tokio::test]
async fn test_direct_mode_rejects_non_url_target() {
    let run = setup();

    let result = run_search(
        &run.config,
        Arc::clone(&run.store),
        caps(FixedSeeds(Vec::new()), GraphFetcher::default()),
        "not a url",
        SearchMode::DirectCrawl,
        RunOptions::default(),
    )
    .await;

    assert!(result.is_err());
    // Nothing was persisted for the rejected run
    let store = run.store.lock().unwrap();
    assert!(store.list_searches(10).unwrap().is_empty());
}

#[tokio::test]
async fn test_business_listing_mode_stores_records() {
    let run = setup();

    let records = vec![
        BusinessRecord {
            name: Some("Acme Plumbing".to_string()),
            phone: Some("555-555-0123".to_string()),
            email: Some("info@acme.test".to_string()),
            address: Some("1 Main St".to_string()),
            website: Some("https://acme.test/".to_string()),
            rating: Some(4.5),
            review_count: Some(12),
        },
        BusinessRecord {
            name: Some("Best Pipes".to_string()),
            phone: Some("555-555-0199".to_string()),
            email: None,
            address: None,
            website: None,
            rating: None,
            review_count: None,
        },
    ];

    let summary = run_search(
        &run.config,
        Arc::clone(&run.store),
        RunCapabilities {
            discovery: Arc::new(FixedSeeds(Vec::new())),
            fetcher: Arc::new(GraphFetcher::default()),
            listing: Some(Arc::new(FixedListing(records))),
        },
        "plumbers in springfield",
        SearchMode::BusinessListing,
        RunOptions::default(),
    )
    .await
    .expect("Run failed");

    assert_eq!(summary.status, SearchStatus::Completed);
    assert_eq!(summary.pages_crawled, 0);
    // 2 businesses + 1 email + 2 phones
    assert_eq!(summary.records_found, 5);

    let store = run.store.lock().unwrap();
    let businesses = store.get_businesses(summary.search_id).unwrap();
    assert_eq!(businesses.len(), 2);
    assert_eq!(businesses[0].record.name.as_deref(), Some("Acme Plumbing"));

    let emails = store.get_emails(summary.search_id).unwrap();
    assert_eq!(emails.len(), 1);
    assert_eq!(
        emails[0].meta.business_name.as_deref(),
        Some("Acme Plumbing")
    );
}

#[tokio::test]
async fn test_business_listing_mode_requires_backend() {
    let run = setup();

    let result = run_search(
        &run.config,
        Arc::clone(&run.store),
        caps(FixedSeeds(Vec::new()), GraphFetcher::default()),
        "plumbers",
        SearchMode::BusinessListing,
        RunOptions::default(),
    )
    .await;

    assert!(result.is_err());
}
