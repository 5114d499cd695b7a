use crate::config::types::Config;
use crate::ConfigError;

/// Validates a parsed configuration
///
/// Checks that numeric limits are usable and that the discovery engine is one
/// the crate knows how to drive.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.crawler.max_workers == 0 {
        return Err(ConfigError::Validation(
            "crawler.max-workers must be at least 1".to_string(),
        ));
    }

    if config.crawler.max_pages == 0 {
        return Err(ConfigError::Validation(
            "crawler.max-pages must be at least 1".to_string(),
        ));
    }

    if config.crawler.status_interval == 0 {
        return Err(ConfigError::Validation(
            "crawler.status-interval must be at least 1".to_string(),
        ));
    }

    if config.fetch.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "fetch.request-timeout-secs must be at least 1".to_string(),
        ));
    }

    match config.discovery.engine.as_str() {
        "duckduckgo" | "bing" => {}
        other => {
            return Err(ConfigError::Validation(format!(
                "discovery.engine must be \"duckduckgo\" or \"bing\", got \"{}\"",
                other
            )));
        }
    }

    if config.discovery.max_search_results == 0 {
        return Err(ConfigError::Validation(
            "discovery.max-search-results must be at least 1".to_string(),
        ));
    }

    if config.extraction.min_email_length > config.extraction.max_email_length {
        return Err(ConfigError::Validation(
            "extraction.min-email-length exceeds max-email-length".to_string(),
        ));
    }

    if config.user_agent.crawler_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent.crawler-name must not be empty".to_string(),
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "storage.database-path must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::*;

    fn valid_config() -> Config {
        Config {
            crawler: CrawlerConfig {
                max_depth: 2,
                max_pages: 100,
                max_workers: 8,
                max_external_links: 5,
                status_interval: 5,
                idle_poll_ms: 250,
                worker_poll_ms: 500,
            },
            fetch: FetchConfig {
                request_delay_ms: 1000,
                request_timeout_secs: 15,
            },
            user_agent: UserAgentConfig {
                crawler_name: "LeadtrawlBot".to_string(),
                crawler_version: "0.1".to_string(),
                contact_url: "https://example.com/bot".to_string(),
                contact_email: "bot@example.com".to_string(),
            },
            storage: StorageConfig {
                database_path: "./leadtrawl.db".to_string(),
            },
            discovery: DiscoveryConfig {
                engine: "duckduckgo".to_string(),
                max_search_results: 20,
                listing_page_count: 3,
            },
            extraction: ExtractionConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = valid_config();
        config.crawler.max_workers = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_max_pages_rejected() {
        let mut config = valid_config();
        config.crawler.max_pages = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_unknown_engine_rejected() {
        let mut config = valid_config();
        config.discovery.engine = "altavista".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("altavista"));
    }

    #[test]
    fn test_inverted_email_lengths_rejected() {
        let mut config = valid_config();
        config.extraction.min_email_length = 200;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_crawler_name_rejected() {
        let mut config = valid_config();
        config.user_agent.crawler_name = "  ".to_string();
        assert!(validate(&config).is_err());
    }
}
