//! Capability contracts consumed by the orchestration core
//!
//! The core does not know how URLs are discovered, how pages are fetched, or
//! how business listings are scraped; it drives these traits. Concrete
//! implementations live in [`crate::discover`] and [`crate::fetch`]; tests
//! substitute mocks.

use async_trait::async_trait;
use thiserror::Error;

pub use crate::storage::BusinessRecord;

/// Contact candidates and outbound links extracted from one fetched page
#[derive(Debug, Clone, Default)]
pub struct PageContacts {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub links: Vec<String>,
}

/// A failed page fetch
///
/// Ordinary HTTP-level failures surface here as values; a fetcher never
/// panics or propagates them as crate errors. A failed item still counts as
/// processed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),
}

/// A failed discovery or listing search
#[derive(Debug, Error)]
#[error("discovery failed: {0}")]
pub struct DiscoveryError(pub String);

/// Streaming callback invoked once per discovered URL
pub type ResultCallback<'a> = &'a (dyn Fn(String) + Send + Sync);

/// Cancellation predicate checked between discovery steps
pub type StopCheck<'a> = &'a (dyn Fn() -> bool + Send + Sync);

/// URL discovery capability
///
/// Implementations push candidate URLs through `on_result` as soon as each
/// is found (so crawling can start before discovery finishes) and must check
/// `should_stop` between incremental steps, returning promptly once it turns
/// true.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        on_result: ResultCallback<'_>,
        should_stop: StopCheck<'_>,
    ) -> Result<(), DiscoveryError>;
}

/// Page-fetch capability
///
/// Enforces its own politeness delay and timeout.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<PageContacts, FetchError>;
}

/// Business-listing capability (maps/directory mode)
#[async_trait]
pub trait ListingSearch: Send + Sync {
    async fn search_listings(
        &self,
        query: &str,
        page_count: u32,
    ) -> Result<Vec<BusinessRecord>, DiscoveryError>;
}
