//! Business-listing capability over web search
//!
//! There is no JavaScript-free maps interface to scrape, so listing mode
//! falls back to a location-style web search: the configured engine finds
//! candidate business sites, each site's front page is fetched once, and a
//! structured record is built from its title and extracted contacts. Sites
//! yielding no contact data are dropped.

use crate::crawl::capabilities::{Discovery, DiscoveryError, ListingSearch};
use crate::discover::HtmlSearchDiscovery;
use crate::extract::ContactExtractor;
use crate::storage::BusinessRecord;
use crate::url::{extract_domain, normalize_url};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::Mutex;
use std::time::Duration;

/// Candidate sites fetched per requested listing page
const SITES_PER_PAGE: usize = 5;

/// Listing capability backed by web search plus single-page contact scrapes
pub struct WebListingSearch {
    discovery: HtmlSearchDiscovery,
    client: Client,
    extractor: ContactExtractor,
    request_delay: Duration,
}

impl WebListingSearch {
    pub fn new(
        discovery: HtmlSearchDiscovery,
        client: Client,
        extractor: ContactExtractor,
        request_delay: Duration,
    ) -> Self {
        Self {
            discovery,
            client,
            extractor,
            request_delay,
        }
    }

    async fn fetch_site(&self, url: &str) -> Option<BusinessRecord> {
        tokio::time::sleep(self.request_delay).await;

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Listing fetch of {} failed: {}", url, e);
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::debug!("Listing fetch of {} returned {}", url, response.status());
            return None;
        }

        let body = response.text().await.ok()?;
        site_record(url, &body, &self.extractor)
    }
}

#[async_trait]
impl ListingSearch for WebListingSearch {
    async fn search_listings(
        &self,
        query: &str,
        page_count: u32,
    ) -> Result<Vec<BusinessRecord>, DiscoveryError> {
        let site_cap = page_count as usize * SITES_PER_PAGE;

        let collected: Mutex<Vec<String>> = Mutex::new(Vec::new());
        let on_result = |url: String| {
            collected.lock().expect("listing lock poisoned").push(url);
        };
        let never_stop = || false;
        self.discovery
            .search(query, site_cap, &on_result, &never_stop)
            .await?;

        let candidates = collected.into_inner().expect("listing lock poisoned");
        tracing::info!("Listing search found {} candidate sites", candidates.len());

        let mut records = Vec::new();
        for url in candidates {
            if let Some(record) = self.fetch_site(&url).await {
                records.push(record);
            }
        }
        Ok(records)
    }
}

/// Builds a business record from one fetched site, if it has contact data
fn site_record(url: &str, body: &str, extractor: &ContactExtractor) -> Option<BusinessRecord> {
    let (emails, phones) = extractor.extract_from_html(body);
    if emails.is_empty() && phones.is_empty() {
        return None;
    }

    let name = page_title(body).or_else(|| {
        normalize_url(url)
            .ok()
            .and_then(|u| extract_domain(&u))
    });

    Some(BusinessRecord {
        name,
        phone: phones.into_iter().next(),
        email: emails.into_iter().next(),
        address: None,
        website: Some(url.to_string()),
        rating: None,
        review_count: None,
    })
}

fn page_title(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    let selector = Selector::parse("title").ok()?;
    let title = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>();
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}
