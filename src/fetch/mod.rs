//! HTTP page fetching
//!
//! [`HttpPageFetcher`] is the production page-fetch capability: a shared
//! reqwest client with a descriptive user agent, a politeness delay before
//! every request, and HTML parsing that feeds the contact extractor and
//! link resolver. HTTP-level failures are classified into [`FetchError`]
//! values so the run controller can count a failed page without aborting.

use crate::config::{Config, FetchConfig, UserAgentConfig};
use crate::crawl::capabilities::{FetchError, PageContacts, PageFetcher};
use crate::extract::ContactExtractor;
use crate::url::resolve_link;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

/// Builds the shared HTTP client
///
/// User agent format: CrawlerName/Version (+ContactURL; ContactEmail)
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    fetch: &FetchConfig,
) -> Result<Client, reqwest::Error> {
    let agent = format!(
        "{}/{} (+{}; {})",
        user_agent.crawler_name,
        user_agent.crawler_version,
        user_agent.contact_url,
        user_agent.contact_email
    );

    Client::builder()
        .user_agent(agent)
        .timeout(Duration::from_secs(fetch.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Production page-fetch capability
pub struct HttpPageFetcher {
    client: Client,
    extractor: ContactExtractor,
    request_delay: Duration,
}

impl HttpPageFetcher {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(&config.user_agent, &config.fetch)?,
            extractor: ContactExtractor::new(&config.extraction),
            request_delay: Duration::from_millis(config.fetch.request_delay_ms),
        })
    }

    /// Wraps an existing client, for callers that already built one
    pub fn with_client(client: Client, config: &Config) -> Self {
        Self {
            client,
            extractor: ContactExtractor::new(&config.extraction),
            request_delay: Duration::from_millis(config.fetch.request_delay_ms),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<PageContacts, FetchError> {
        tokio::time::sleep(self.request_delay).await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if !is_html(&response) {
            tracing::debug!("Skipping non-HTML response from {}", url);
            return Ok(PageContacts::default());
        }

        // Final URL after redirects, so relative links resolve correctly
        let final_url = response.url().clone();
        let body = response.text().await.map_err(classify_error)?;

        Ok(self.parse_page(&final_url, &body))
    }
}

impl HttpPageFetcher {
    fn parse_page(&self, page_url: &Url, body: &str) -> PageContacts {
        let (emails, phones) = self.extractor.extract_from_html(body);
        let links = extract_links(page_url, body);
        PageContacts {
            emails,
            phones,
            links,
        }
    }
}

fn is_html(response: &reqwest::Response) -> bool {
    match response.headers().get(reqwest::header::CONTENT_TYPE) {
        Some(value) => value
            .to_str()
            .map(|v| v.starts_with("text/html") || v.starts_with("application/xhtml"))
            .unwrap_or(false),
        // No Content-Type header: assume HTML and let the parser cope
        None => true,
    }
}

/// Extracts and resolves all anchor hrefs on the page
fn extract_links(page_url: &Url, body: &str) -> Vec<String> {
    let document = Html::parse_document(body);
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(resolved) = resolve_link(page_url, href) {
                    links.push(resolved.to_string());
                }
            }
        }
    }

    links
}

/// Maps a reqwest error onto the fetch-error taxonomy
fn classify_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = e.status() {
        FetchError::Status(status.as_u16())
    } else {
        FetchError::Network(e.to_string())
    }
}
