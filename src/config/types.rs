use serde::Deserialize;

/// Main configuration structure for leadtrawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub fetch: FetchConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

/// Crawl orchestration configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum depth to follow links from seed URLs
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum pages processed per search
    #[serde(rename = "max-pages")]
    pub max_pages: u64,

    /// Number of concurrent fetch workers
    #[serde(rename = "max-workers")]
    pub max_workers: usize,

    /// Maximum external-domain links followed per page
    #[serde(rename = "max-external-links")]
    pub max_external_links: usize,

    /// Checkpoint progress to storage every N completed pages
    #[serde(rename = "status-interval", default = "default_status_interval")]
    pub status_interval: u64,

    /// Idle wait when the frontier is empty but discovery is still running
    #[serde(rename = "idle-poll-ms", default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,

    /// Bounded wait for an in-flight worker before re-checking the stop signal
    #[serde(rename = "worker-poll-ms", default = "default_worker_poll_ms")]
    pub worker_poll_ms: u64,
}

/// Page fetching configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Politeness delay before each request (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// URL discovery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Search engine used for web discovery ("duckduckgo" or "bing")
    pub engine: String,

    /// Number of seed URLs requested from the search engine
    #[serde(rename = "max-search-results")]
    pub max_search_results: usize,

    /// Result pages requested in business-listing mode
    #[serde(rename = "listing-page-count", default = "default_listing_page_count")]
    pub listing_page_count: u32,
}

/// Contact extraction configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Minimum accepted email length
    #[serde(rename = "min-email-length", default = "default_min_email_length")]
    pub min_email_length: usize,

    /// Maximum accepted email length
    #[serde(rename = "max-email-length", default = "default_max_email_length")]
    pub max_email_length: usize,

    /// Substrings that mark an email as a placeholder or auto-sender
    #[serde(rename = "excluded-patterns", default = "default_excluded_patterns")]
    pub excluded_patterns: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_email_length: default_min_email_length(),
            max_email_length: default_max_email_length(),
            excluded_patterns: default_excluded_patterns(),
        }
    }
}

fn default_status_interval() -> u64 {
    5
}

fn default_idle_poll_ms() -> u64 {
    250
}

fn default_worker_poll_ms() -> u64 {
    500
}

fn default_listing_page_count() -> u32 {
    3
}

fn default_min_email_length() -> usize {
    6
}

fn default_max_email_length() -> usize {
    100
}

fn default_excluded_patterns() -> Vec<String> {
    [
        "example.com",
        "test.com",
        "sample.com",
        "domain.com",
        "email.com",
        "your-email.com",
        "noreply@",
        "no-reply@",
        "donotreply@",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
