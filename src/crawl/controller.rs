//! Run controller: drives one search run from `running` to a terminal status
//!
//! A single controller task owns the run's counters. Fetch workers run in a
//! [`JoinSet`] topped up to `max-workers`; the controller folds each
//! completed fetch into the counters and the store, offers child links back
//! to the frontier, and checkpoints progress every `status-interval`
//! completions. Cancellation is cooperative: the persisted status is polled
//! each drain cycle, and an externally written `stopped` wins over whatever
//! the controller would have written.

use crate::config::CrawlerConfig;
use crate::crawl::capabilities::{FetchError, PageContacts, PageFetcher};
use crate::crawl::frontier::{Frontier, WorkItem};
use crate::crawl::producer::{enqueue_seed, ProducerHandle};
use crate::extract::email_domain;
use crate::storage::{BusinessMeta, SearchStatus, SearchStore, StorageResult};
use crate::url::{extract_domain, normalize_url};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinSet;

/// Store handle shared between the controller and its fetch workers
pub type SharedStore = Arc<Mutex<dyn SearchStore>>;

/// Per-run scraping toggles
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Store extracted email addresses
    pub scrape_emails: bool,

    /// Store extracted phone numbers
    pub scrape_phones: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            scrape_emails: true,
            scrape_phones: true,
        }
    }
}

/// How the drain loop ended
enum DrainEnd {
    Completed { message: Option<String> },
    Stopped,
}

type FetchOutcome = (WorkItem, Result<PageContacts, FetchError>);

/// One fetch worker: fetch the page, then mark the URL crawled
///
/// The URL is marked crawled whether or not the fetch succeeded; a failed
/// item still counts as processed and is never retried within the run.
async fn fetch_one(
    fetcher: Arc<dyn PageFetcher>,
    store: SharedStore,
    search_id: i64,
    item: WorkItem,
) -> FetchOutcome {
    let result = fetcher.fetch(&item.url).await;
    let marked = store
        .lock()
        .expect("store lock poisoned")
        .mark_url_crawled(search_id, &item.url);
    if let Err(e) = marked {
        tracing::warn!("Failed to mark {} as crawled: {}", item.url, e);
    }
    (item, result)
}

/// State for one crawl-mode search run
pub struct CrawlRun {
    store: SharedStore,
    fetcher: Arc<dyn PageFetcher>,
    frontier: Arc<Frontier>,
    crawler: CrawlerConfig,
    options: RunOptions,
    search_id: i64,
    query: String,
    stop: Arc<AtomicBool>,
    pages_crawled: u64,
    records_found: u64,
    since_checkpoint: u64,
    seed_retried: bool,
}

impl CrawlRun {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: SharedStore,
        fetcher: Arc<dyn PageFetcher>,
        frontier: Arc<Frontier>,
        crawler: CrawlerConfig,
        options: RunOptions,
        search_id: i64,
        query: String,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            store,
            fetcher,
            frontier,
            crawler,
            options,
            search_id,
            query,
            stop,
            pages_crawled: 0,
            records_found: 0,
            since_checkpoint: 0,
            seed_retried: false,
        }
    }

    pub fn pages_crawled(&self) -> u64 {
        self.pages_crawled
    }

    pub fn records_found(&self) -> u64 {
        self.records_found
    }

    /// Runs the drain loop to a terminal status and persists it
    ///
    /// Returns the summary message, if any. Storage failures bubble up after
    /// a best-effort attempt to finalize the search as `error`.
    pub async fn run(&mut self, producer: ProducerHandle) -> StorageResult<Option<String>> {
        let mut in_flight: JoinSet<FetchOutcome> = JoinSet::new();

        let end = match self.drain(&producer, &mut in_flight).await {
            Ok(end) => end,
            Err(e) => {
                in_flight.abort_all();
                self.stop.store(true, Ordering::Release);
                let _ = self.finalize(SearchStatus::Error, Some(&e.to_string()));
                return Err(e);
            }
        };

        // In-flight workers finish their current fetch but their results are
        // discarded, so pages_crawled counts only items already folded.
        while in_flight.join_next().await.is_some() {}
        producer.join().await;

        match end {
            DrainEnd::Completed { message } => {
                self.finalize(SearchStatus::Completed, None)?;
                Ok(message)
            }
            DrainEnd::Stopped => {
                self.finalize(SearchStatus::Stopped, None)?;
                Ok(None)
            }
        }
    }

    async fn drain(
        &mut self,
        producer: &ProducerHandle,
        in_flight: &mut JoinSet<FetchOutcome>,
    ) -> StorageResult<DrainEnd> {
        loop {
            if self.stop_requested()? {
                tracing::info!("Search {} stop requested", self.search_id);
                return Ok(DrainEnd::Stopped);
            }

            if self.pages_crawled >= self.crawler.max_pages {
                tracing::info!(
                    "Search {} reached page limit of {}",
                    self.search_id,
                    self.crawler.max_pages
                );
                return Ok(DrainEnd::Completed { message: None });
            }

            self.top_up(in_flight)?;

            if in_flight.is_empty() {
                if producer.is_done() && self.frontier.is_empty() {
                    if let Some(message) = self.handle_exhausted()? {
                        return Ok(DrainEnd::Completed { message });
                    }
                    continue;
                }
                tokio::time::sleep(Duration::from_millis(self.crawler.idle_poll_ms)).await;
                continue;
            }

            let wait = Duration::from_millis(self.crawler.worker_poll_ms);
            match tokio::time::timeout(wait, in_flight.join_next()).await {
                Err(_) => continue,
                Ok(None) => continue,
                Ok(Some(Err(e))) => {
                    tracing::warn!("Fetch worker failed to complete: {}", e);
                }
                Ok(Some(Ok((item, result)))) => self.fold(item, result)?,
            }
        }
    }

    /// Spawns workers until the pool is full or the frontier runs dry
    ///
    /// Items never started also never count toward the page limit, so the
    /// pool stays small enough that completed plus in-flight cannot exceed
    /// `max-pages`.
    fn top_up(&mut self, in_flight: &mut JoinSet<FetchOutcome>) -> StorageResult<()> {
        while in_flight.len() < self.crawler.max_workers
            && self.pages_crawled + (in_flight.len() as u64) < self.crawler.max_pages
        {
            let item = match self.frontier.dequeue() {
                Some(item) => item,
                None => break,
            };

            // A URL crawled by an earlier run against the same search id is
            // skipped without counting as a processed page.
            let crawled = self
                .store
                .lock()
                .expect("store lock poisoned")
                .is_url_crawled(self.search_id, &item.url)?;
            if crawled {
                continue;
            }

            tracing::debug!("Fetching {} at depth {}", item.url, item.depth);
            in_flight.spawn(fetch_one(
                Arc::clone(&self.fetcher),
                Arc::clone(&self.store),
                self.search_id,
                item,
            ));
        }
        Ok(())
    }

    /// Folds one finished fetch into counters, storage, and the frontier
    fn fold(
        &mut self,
        item: WorkItem,
        result: Result<PageContacts, FetchError>,
    ) -> StorageResult<()> {
        self.pages_crawled += 1;
        self.since_checkpoint += 1;

        match result {
            Ok(contacts) => {
                self.store_contacts(&item, &contacts)?;
                if item.depth < self.crawler.max_depth {
                    self.offer_links(&item, &contacts.links);
                }
            }
            Err(e) => {
                tracing::debug!("Fetch of {} failed: {}", item.url, e);
            }
        }

        if self.since_checkpoint >= self.crawler.status_interval {
            self.checkpoint(Some(&item.url))?;
            self.since_checkpoint = 0;
        }
        Ok(())
    }

    fn store_contacts(&mut self, item: &WorkItem, contacts: &PageContacts) -> StorageResult<()> {
        let meta = BusinessMeta::default();
        let mut store = self.store.lock().expect("store lock poisoned");

        if self.options.scrape_emails {
            for email in &contacts.emails {
                let domain = email_domain(email);
                if store.add_email(self.search_id, email, &item.url, domain.as_deref(), &meta)? {
                    self.records_found += 1;
                }
            }
        }
        if self.options.scrape_phones {
            for phone in &contacts.phones {
                if store.add_phone(self.search_id, phone, &item.url, &meta)? {
                    self.records_found += 1;
                }
            }
        }
        Ok(())
    }

    /// Offers child links back to the frontier, internal links first
    ///
    /// Links on the same domain the page was reached through keep that
    /// origin; external links are capped at `max-external-links` per page
    /// and carry their own domain as the new origin. Both kinds sit one
    /// level deeper than the page they came from.
    fn offer_links(&self, item: &WorkItem, links: &[String]) {
        let child_depth = item.depth + 1;
        let mut external = Vec::new();

        for link in links {
            let url = match normalize_url(link) {
                Ok(url) => url,
                Err(_) => continue,
            };
            let domain = match extract_domain(&url) {
                Some(domain) => domain,
                None => continue,
            };
            if domain == item.origin_domain {
                self.frontier
                    .try_enqueue(WorkItem::new(url.as_str(), child_depth, domain));
            } else {
                external.push((url, domain));
            }
        }

        for (url, domain) in external.into_iter().take(self.crawler.max_external_links) {
            self.frontier
                .try_enqueue(WorkItem::new(url.as_str(), child_depth, domain));
        }
    }

    /// Decides the outcome once discovery is done and all work has drained
    ///
    /// `Some` ends the run as completed. `None` means a retry seed was
    /// enqueued and the loop should continue: a dotted, space-free query
    /// that produced no seeds at all is tried once as a direct URL.
    fn handle_exhausted(&mut self) -> StorageResult<Option<Option<String>>> {
        if self.frontier.total_enqueued() > 0 || self.pages_crawled > 0 {
            return Ok(Some(None));
        }

        if !self.seed_retried {
            self.seed_retried = true;
            let query = self.query.trim();
            if query.contains('.') && !query.contains(' ') {
                let candidate = format!("https://{}", query);
                if enqueue_seed(&self.frontier, &candidate) {
                    tracing::info!("No seeds discovered, trying {} directly", candidate);
                    return Ok(None);
                }
            }
        }

        Ok(Some(Some("no relevant sources found".to_string())))
    }

    /// Signals stop if the caller asked for it or an external writer marked
    /// the search stopped in the store
    fn stop_requested(&mut self) -> StorageResult<bool> {
        if self.stop.load(Ordering::Acquire) {
            return Ok(true);
        }
        let record = self
            .store
            .lock()
            .expect("store lock poisoned")
            .get_search(self.search_id)?;
        if record.status == SearchStatus::Stopped {
            self.stop.store(true, Ordering::Release);
            return Ok(true);
        }
        Ok(false)
    }

    fn checkpoint(&mut self, current_url: Option<&str>) -> StorageResult<()> {
        self.store
            .lock()
            .expect("store lock poisoned")
            .update_search_status(
                self.search_id,
                SearchStatus::Running,
                Some(self.pages_crawled),
                Some(self.records_found),
                current_url,
                None,
            )
    }

    fn finalize(&mut self, status: SearchStatus, error_message: Option<&str>) -> StorageResult<()> {
        self.store
            .lock()
            .expect("store lock poisoned")
            .update_search_status(
                self.search_id,
                status,
                Some(self.pages_crawled),
                Some(self.records_found),
                None,
                error_message,
            )
    }
}
