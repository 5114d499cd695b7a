//! Leadtrawl: a contact-discovery crawler
//!
//! This crate discovers web pages relevant to a query and extracts contact
//! data (emails, phone numbers, business records) from them. The core is a
//! bounded-concurrency frontier crawler: a streaming URL-discovery producer
//! feeds a pool of page-fetching workers, coordinated by a run controller
//! that persists incremental progress so callers can poll status at any time.

pub mod config;
pub mod crawl;
pub mod discover;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for leadtrawl operations
#[derive(Debug, Error)]
pub enum TrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Search {0} not found")]
    SearchNotFound(i64),

    #[error("Invalid search target: {0}")]
    InvalidTarget(String),

    #[error("No listing backend configured for business-listing mode")]
    NoListingBackend,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for leadtrawl operations
pub type Result<T> = std::result::Result<T, TrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawl::{run_search, RunSummary, SearchMode};
pub use storage::SearchStatus;
pub use url::{extract_domain, normalize_url};
