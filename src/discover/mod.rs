//! URL discovery over search-engine HTML result pages
//!
//! [`HtmlSearchDiscovery`] implements the discovery capability by scraping
//! the HTML (no-JavaScript) result pages of a configured engine. Results
//! stream to the caller as each page is parsed, and the stop check runs
//! between page requests so cancellation never waits on deep pagination.

mod listing;

pub use listing::WebListingSearch;

use crate::crawl::capabilities::{Discovery, DiscoveryError, ResultCallback, StopCheck};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use url::{form_urlencoded, Url};

/// Upper bound on result pages requested per search
const MAX_RESULT_PAGES: usize = 10;

/// Supported search engines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEngine {
    DuckDuckGo,
    Bing,
}

impl SearchEngine {
    /// Engine by config name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "duckduckgo" => Some(Self::DuckDuckGo),
            "bing" => Some(Self::Bing),
            _ => None,
        }
    }

    /// URL of the nth result page for a query
    fn result_page_url(&self, query: &str, page: usize) -> String {
        let q: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
        match self {
            Self::DuckDuckGo => {
                if page == 0 {
                    format!("https://html.duckduckgo.com/html/?q={}", q)
                } else {
                    format!("https://html.duckduckgo.com/html/?q={}&s={}", q, page * 30)
                }
            }
            Self::Bing => format!("https://www.bing.com/search?q={}&first={}", q, page * 10 + 1),
        }
    }

    /// CSS selector matching organic result anchors
    fn result_selector(&self) -> &'static str {
        match self {
            Self::DuckDuckGo => "a.result__a",
            Self::Bing => "li.b_algo h2 a",
        }
    }

    fn is_own_host(&self, host: &str) -> bool {
        match self {
            Self::DuckDuckGo => host.ends_with("duckduckgo.com"),
            Self::Bing => host.ends_with("bing.com"),
        }
    }
}

/// Discovery capability backed by search-engine HTML result pages
pub struct HtmlSearchDiscovery {
    client: Client,
    engine: SearchEngine,
    request_delay: Duration,
    base_override: Option<String>,
}

impl HtmlSearchDiscovery {
    pub fn new(client: Client, engine: SearchEngine, request_delay: Duration) -> Self {
        Self {
            client,
            engine,
            request_delay,
            base_override: None,
        }
    }

    /// Points page requests at a different host, for tests against a local
    /// mock server
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_override = Some(base.into());
        self
    }

    fn page_url(&self, query: &str, page: usize) -> String {
        let url = self.engine.result_page_url(query, page);
        match &self.base_override {
            Some(base) => {
                let parsed = Url::parse(&url).expect("engine urls are well formed");
                format!("{}{}?{}", base, parsed.path(), parsed.query().unwrap_or(""))
            }
            None => url,
        }
    }

    async fn fetch_result_page(&self, url: &str) -> Result<String, DiscoveryError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DiscoveryError(e.to_string()))?;
        let response = response
            .error_for_status()
            .map_err(|e| DiscoveryError(e.to_string()))?;
        response
            .text()
            .await
            .map_err(|e| DiscoveryError(e.to_string()))
    }
}

#[async_trait]
impl Discovery for HtmlSearchDiscovery {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        on_result: ResultCallback<'_>,
        should_stop: StopCheck<'_>,
    ) -> Result<(), DiscoveryError> {
        let mut seen: HashSet<String> = HashSet::new();

        for page in 0..MAX_RESULT_PAGES {
            if should_stop() {
                tracing::debug!("Discovery cancelled before page {}", page + 1);
                return Ok(());
            }
            if page > 0 {
                tokio::time::sleep(self.request_delay).await;
            }

            let page_url = self.page_url(query, page);
            let body = match self.fetch_result_page(&page_url).await {
                Ok(body) => body,
                // A failed first page is a failed search; later pages just
                // end pagination with what we have.
                Err(e) if page == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!("Result page {} failed: {}", page + 1, e);
                    return Ok(());
                }
            };

            let urls = extract_result_urls(self.engine, &body);
            let mut new_on_page = 0;
            for url in urls {
                if !seen.insert(url.clone()) {
                    continue;
                }
                new_on_page += 1;
                on_result(url);
                if seen.len() >= max_results {
                    return Ok(());
                }
            }

            tracing::debug!(
                "Result page {}: {} new URLs ({}/{})",
                page + 1,
                new_on_page,
                seen.len(),
                max_results
            );
            if new_on_page == 0 {
                return Ok(());
            }
        }

        Ok(())
    }
}

/// Pulls organic result URLs out of one result page
fn extract_result_urls(engine: SearchEngine, body: &str) -> Vec<String> {
    let document = Html::parse_document(body);
    let mut urls = Vec::new();

    if let Ok(selector) = Selector::parse(engine.result_selector()) {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(target) = resolve_target(engine, href) {
                    urls.push(target);
                }
            }
        }
    }

    urls
}

/// Unwraps an engine's redirect wrapper, dropping links back into the engine
fn resolve_target(engine: SearchEngine, href: &str) -> Option<String> {
    let absolute = match href.strip_prefix("//") {
        Some(rest) => format!("https://{}", rest),
        None => href.to_string(),
    };
    let url = Url::parse(&absolute).ok()?;
    let host = url.host_str()?;

    if !engine.is_own_host(host) {
        return Some(absolute);
    }

    // DuckDuckGo wraps targets as /l/?uddg=<encoded url>
    let target = url
        .query_pairs()
        .find_map(|(k, v)| (k == "uddg").then(|| v.into_owned()))?;
    target.starts_with("http").then_some(target)
}
