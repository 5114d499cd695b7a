//! Configuration module for leadtrawl
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. There is no ambient settings store: the configuration is loaded
//! once and passed by reference into the components that need it.
//!
//! # Example
//!
//! ```no_run
//! use leadtrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawl workers: {}", config.crawler.max_workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DiscoveryConfig, ExtractionConfig, FetchConfig, StorageConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::load_config;
pub use validation::validate;
