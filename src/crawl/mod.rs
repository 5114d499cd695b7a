//! Crawl orchestration: frontier, discovery producer, and run controller
//!
//! [`run_search`] is the single entry point for executing a search run. It
//! creates the persisted search record, wires the configured capabilities
//! together, and drives the run to a terminal status.

pub mod capabilities;
pub mod controller;
pub mod frontier;
pub mod producer;

pub use controller::{RunOptions, SharedStore};

use crate::config::Config;
use crate::crawl::capabilities::{Discovery, ListingSearch, PageFetcher};
use crate::crawl::controller::CrawlRun;
use crate::crawl::frontier::Frontier;
use crate::crawl::producer::{enqueue_seed, spawn_producer, ProducerHandle};
use crate::extract::email_domain;
use crate::storage::{SearchStatus, StorageResult};
use crate::url::normalize_url;
use crate::{Result, TrawlError};
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Social platform targeted by a social-mode search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialPlatform {
    LinkedIn,
    Twitter,
    Instagram,
    Facebook,
}

impl SocialPlatform {
    /// Search-engine filter restricting results to this platform
    pub fn site_filter(&self) -> &'static str {
        match self {
            Self::LinkedIn => "site:linkedin.com/in/ OR site:linkedin.com/company/",
            Self::Twitter => "site:twitter.com",
            Self::Instagram => "site:instagram.com",
            Self::Facebook => "site:facebook.com",
        }
    }
}

impl FromStr for SocialPlatform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linkedin" => Ok(Self::LinkedIn),
            "twitter" | "x" => Ok(Self::Twitter),
            "instagram" => Ok(Self::Instagram),
            "facebook" => Ok(Self::Facebook),
            other => Err(format!("unknown social platform: {}", other)),
        }
    }
}

/// How a search run finds its pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Seed from a web search engine
    WebDiscovery,

    /// Web discovery restricted to one social platform
    SocialDiscovery(SocialPlatform),

    /// Business-listing shortcut: structured records, no crawling
    BusinessListing,

    /// Crawl a single given URL directly
    DirectCrawl,
}

impl SearchMode {
    /// Mode string as persisted in the searches table
    pub fn db_mode(&self) -> &'static str {
        match self {
            Self::WebDiscovery => "web",
            Self::SocialDiscovery(_) => "social",
            Self::BusinessListing => "maps",
            Self::DirectCrawl => "direct",
        }
    }

    /// Query as sent to the discovery capability
    fn effective_query(&self, query: &str) -> String {
        match self {
            Self::SocialDiscovery(platform) => format!("{} {}", query, platform.site_filter()),
            _ => query.to_string(),
        }
    }
}

/// Capability implementations wired into a run
pub struct RunCapabilities {
    pub discovery: Arc<dyn Discovery>,
    pub fetcher: Arc<dyn PageFetcher>,
    pub listing: Option<Arc<dyn ListingSearch>>,
}

/// Outcome of a finished search run
///
/// Status and counters are read back from the store after finalization, so
/// an externally written `stopped` is reflected here.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub search_id: i64,
    pub status: SearchStatus,
    pub pages_crawled: u64,
    pub records_found: u64,
    pub message: Option<String>,
}

/// Executes one search run to a terminal status
///
/// Creates the search record, runs the mode-appropriate pipeline, and
/// returns the persisted outcome. Capability failures (discovery, listing)
/// finalize the search as `error` and still return `Ok`; storage failures
/// are returned as errors after a best-effort `error` finalization.
pub async fn run_search(
    config: &Config,
    store: SharedStore,
    caps: RunCapabilities,
    query: &str,
    mode: SearchMode,
    options: RunOptions,
) -> Result<RunSummary> {
    let direct_target = match mode {
        SearchMode::DirectCrawl => Some(resolve_direct_target(query)?),
        _ => None,
    };
    let mut listing_backend = match mode {
        SearchMode::BusinessListing => {
            Some(caps.listing.clone().ok_or(TrawlError::NoListingBackend)?)
        }
        _ => None,
    };

    let search_id = store
        .lock()
        .expect("store lock poisoned")
        .create_search(query, mode.db_mode())?;
    tracing::info!("Search {} started: {:?} {}", search_id, mode, query);

    let message = match mode {
        SearchMode::BusinessListing => {
            let listing = listing_backend.take().ok_or(TrawlError::NoListingBackend)?;
            run_listing(
                &store,
                listing,
                search_id,
                query,
                config.discovery.listing_page_count,
                options,
            )
            .await?
        }
        _ => {
            let frontier = Arc::new(Frontier::new());
            let stop = Arc::new(AtomicBool::new(false));

            let producer = if let Some(target) = &direct_target {
                enqueue_seed(&frontier, target);
                ProducerHandle::finished()
            } else {
                spawn_producer(
                    Arc::clone(&caps.discovery),
                    mode.effective_query(query),
                    config.discovery.max_search_results,
                    Arc::clone(&frontier),
                    Arc::clone(&stop),
                )
            };

            let mut run = CrawlRun::new(
                Arc::clone(&store),
                Arc::clone(&caps.fetcher),
                frontier,
                config.crawler.clone(),
                options,
                search_id,
                query.to_string(),
                stop,
            );
            run.run(producer).await?
        }
    };

    let record = store
        .lock()
        .expect("store lock poisoned")
        .get_search(search_id)?;
    tracing::info!(
        "Search {} finished: {} ({} pages, {} records)",
        search_id,
        record.status,
        record.pages_crawled,
        record.records_found
    );

    Ok(RunSummary {
        search_id,
        status: record.status,
        pages_crawled: record.pages_crawled,
        records_found: record.records_found,
        message,
    })
}

/// Resolves a direct-crawl target into a crawlable URL
///
/// Bare domains are accepted: a target without a scheme is retried with
/// `https://` prepended before being rejected.
fn resolve_direct_target(query: &str) -> Result<String> {
    if let Ok(url) = normalize_url(query) {
        return Ok(url.to_string());
    }
    if !query.starts_with("http") {
        let candidate = format!("https://{}", query);
        if let Ok(url) = normalize_url(&candidate) {
            return Ok(url.to_string());
        }
    }
    Err(TrawlError::InvalidTarget(query.to_string()))
}

/// Business-listing mode: one listing call, stored records, no frontier
async fn run_listing(
    store: &SharedStore,
    listing: Arc<dyn ListingSearch>,
    search_id: i64,
    query: &str,
    page_count: u32,
    options: RunOptions,
) -> Result<Option<String>> {
    let outcome = listing.search_listings(query, page_count).await;

    let records = match outcome {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!("Listing search failed: {}", e);
            finalize_listing(store, search_id, SearchStatus::Error, 0, Some(&e.to_string()))?;
            return Ok(None);
        }
    };

    let mut found: u64 = 0;
    {
        let mut store = store.lock().expect("store lock poisoned");
        for record in &records {
            let meta = record.meta();
            let source = record.website.as_deref().unwrap_or("business-listing");

            if store.add_business(search_id, record, source)? {
                found += 1;
            }
            if options.scrape_emails {
                if let Some(email) = &record.email {
                    let email = email.to_lowercase();
                    let domain = email_domain(&email);
                    if store.add_email(search_id, &email, source, domain.as_deref(), &meta)? {
                        found += 1;
                    }
                }
            }
            if options.scrape_phones {
                if let Some(phone) = &record.phone {
                    if store.add_phone(search_id, phone, source, &meta)? {
                        found += 1;
                    }
                }
            }
        }
    }

    finalize_listing(store, search_id, SearchStatus::Completed, found, None)?;
    if records.is_empty() {
        Ok(Some("no relevant sources found".to_string()))
    } else {
        Ok(None)
    }
}

fn finalize_listing(
    store: &SharedStore,
    search_id: i64,
    status: SearchStatus,
    records_found: u64,
    error_message: Option<&str>,
) -> StorageResult<()> {
    store
        .lock()
        .expect("store lock poisoned")
        .update_search_status(
            search_id,
            status,
            Some(0),
            Some(records_found),
            None,
            error_message,
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_mode_strings() {
        assert_eq!(SearchMode::WebDiscovery.db_mode(), "web");
        assert_eq!(
            SearchMode::SocialDiscovery(SocialPlatform::LinkedIn).db_mode(),
            "social"
        );
        assert_eq!(SearchMode::BusinessListing.db_mode(), "maps");
        assert_eq!(SearchMode::DirectCrawl.db_mode(), "direct");
    }

    #[test]
    fn test_social_query_rewrite() {
        let mode = SearchMode::SocialDiscovery(SocialPlatform::Twitter);
        assert_eq!(
            mode.effective_query("acme plumbing"),
            "acme plumbing site:twitter.com"
        );
        assert_eq!(
            SearchMode::WebDiscovery.effective_query("acme plumbing"),
            "acme plumbing"
        );
    }

    #[test]
    fn test_direct_target_accepts_bare_domain() {
        assert_eq!(
            resolve_direct_target("example.com").unwrap(),
            "https://example.com/"
        );
        assert_eq!(
            resolve_direct_target("https://example.com/team").unwrap(),
            "https://example.com/team"
        );
        assert!(matches!(
            resolve_direct_target("not a url"),
            Err(TrawlError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_social_platform_parsing() {
        assert_eq!(
            "LinkedIn".parse::<SocialPlatform>().unwrap(),
            SocialPlatform::LinkedIn
        );
        assert_eq!(
            "x".parse::<SocialPlatform>().unwrap(),
            SocialPlatform::Twitter
        );
        assert!("myspace".parse::<SocialPlatform>().is_err());
    }
}
