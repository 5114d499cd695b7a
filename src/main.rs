//! Leadtrawl command-line interface
//!
//! Search runs execute in the foreground; `status`, `stop`, `results`,
//! `history`, `export`, and `delete` operate on the shared SQLite database,
//! so a run in one terminal can be inspected or stopped from another.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use leadtrawl::config::load_config;
use leadtrawl::crawl::{run_search, RunCapabilities, RunOptions, SearchMode, SharedStore};
use leadtrawl::discover::{HtmlSearchDiscovery, SearchEngine, WebListingSearch};
use leadtrawl::export::{collect_results, ExportFormat};
use leadtrawl::extract::ContactExtractor;
use leadtrawl::fetch::{build_http_client, HttpPageFetcher};
use leadtrawl::storage::{SearchStatus, SearchStore, SqliteStorage};
use leadtrawl::Config;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Leadtrawl: a contact-discovery crawler
///
/// Leadtrawl finds web pages relevant to a query, crawls them with a
/// bounded worker pool, and extracts emails, phone numbers, and business
/// records into a local SQLite database.
#[derive(Parser, Debug)]
#[command(name = "leadtrawl")]
#[command(version = "0.1.0")]
#[command(about = "A contact-discovery crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, global = true, default_value = "leadtrawl.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a search to completion
    Run {
        /// Search query, or a URL in direct mode
        query: String,

        /// Search mode: web, social, maps, or direct
        #[arg(long, default_value = "web")]
        mode: String,

        /// Social platform (linkedin, twitter, instagram, facebook)
        #[arg(long)]
        platform: Option<String>,

        /// Override the configured search engine for this run
        #[arg(long)]
        engine: Option<String>,

        /// Override the configured page limit for this run
        #[arg(long)]
        max_pages: Option<u64>,

        /// Override the configured crawl depth for this run
        #[arg(long)]
        max_depth: Option<u32>,

        /// Skip storing email addresses
        #[arg(long)]
        no_emails: bool,

        /// Skip storing phone numbers
        #[arg(long)]
        no_phones: bool,
    },

    /// Show the status of a search
    Status { search_id: i64 },

    /// Request a running search to stop
    Stop { search_id: i64 },

    /// Print the stored results of a search
    Results { search_id: i64 },

    /// List recent searches
    History {
        /// Maximum number of searches to show
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },

    /// Export the results of a search to a file
    Export {
        search_id: i64,

        /// Output format: csv or json
        #[arg(long, default_value = "csv")]
        format: String,

        /// Output path (defaults to results_<id>.<format>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a search and all of its records
    Delete { search_id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    let mut storage = SqliteStorage::new(Path::new(&config.storage.database_path))
        .with_context(|| format!("failed to open {}", config.storage.database_path))?;

    match cli.command {
        Command::Run {
            query,
            mode,
            platform,
            engine,
            max_pages,
            max_depth,
            no_emails,
            no_phones,
        } => {
            let mut config = config;
            if let Some(max_pages) = max_pages {
                config.crawler.max_pages = max_pages;
            }
            if let Some(max_depth) = max_depth {
                config.crawler.max_depth = max_depth;
            }
            if let Some(engine) = engine {
                config.discovery.engine = engine;
            }
            let options = RunOptions {
                scrape_emails: !no_emails,
                scrape_phones: !no_phones,
            };
            handle_run(config, storage, &query, &mode, platform.as_deref(), options).await
        }
        Command::Status { search_id } => handle_status(&storage, search_id),
        Command::Stop { search_id } => handle_stop(&mut storage, search_id),
        Command::Results { search_id } => handle_results(&storage, search_id),
        Command::History { limit } => handle_history(&storage, limit),
        Command::Export {
            search_id,
            format,
            output,
        } => handle_export(&storage, search_id, &format, output),
        Command::Delete { search_id } => handle_delete(&mut storage, search_id),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("leadtrawl=info,warn"),
            1 => EnvFilter::new("leadtrawl=debug,info"),
            2 => EnvFilter::new("leadtrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

async fn handle_run(
    config: Config,
    storage: SqliteStorage,
    query: &str,
    mode: &str,
    platform: Option<&str>,
    options: RunOptions,
) -> Result<()> {
    let mode = match mode {
        "web" => SearchMode::WebDiscovery,
        "social" => {
            let platform = platform.context("--platform is required in social mode")?;
            SearchMode::SocialDiscovery(platform.parse().map_err(anyhow::Error::msg)?)
        }
        "maps" => SearchMode::BusinessListing,
        "direct" => SearchMode::DirectCrawl,
        other => bail!("invalid mode: {} (use web, social, maps, or direct)", other),
    };

    let engine = SearchEngine::from_name(&config.discovery.engine)
        .with_context(|| format!("invalid search engine: {}", config.discovery.engine))?;
    let client = build_http_client(&config.user_agent, &config.fetch)?;
    let request_delay = Duration::from_millis(config.fetch.request_delay_ms);

    let caps = RunCapabilities {
        discovery: Arc::new(HtmlSearchDiscovery::new(
            client.clone(),
            engine,
            request_delay,
        )),
        fetcher: Arc::new(HttpPageFetcher::with_client(client.clone(), &config)),
        listing: Some(Arc::new(WebListingSearch::new(
            HtmlSearchDiscovery::new(client.clone(), engine, request_delay),
            client,
            ContactExtractor::new(&config.extraction),
            request_delay,
        ))),
    };
    let store: SharedStore = Arc::new(Mutex::new(storage));

    let summary = run_search(&config, store, caps, query, mode, options).await?;

    println!("\n=== Search {} ===", summary.search_id);
    println!("Status:        {}", summary.status);
    println!("Pages crawled: {}", summary.pages_crawled);
    println!("Records found: {}", summary.records_found);
    if let Some(message) = &summary.message {
        println!("Note:          {}", message);
    }
    Ok(())
}

fn handle_status(storage: &SqliteStorage, search_id: i64) -> Result<()> {
    let search = storage.get_search(search_id)?;

    println!("Search {}: {}", search.id, search.query);
    println!("  Mode:          {}", search.mode);
    println!("  Status:        {}", search.status);
    println!("  Pages crawled: {}", search.pages_crawled);
    println!("  Records found: {}", search.records_found);
    if let Some(url) = &search.current_url {
        println!("  Current URL:   {}", url);
    }
    if let Some(message) = &search.error_message {
        println!("  Error:         {}", message);
    }
    println!("  Started:       {}", search.created_at);
    if let Some(finished) = &search.completed_at {
        println!("  Finished:      {}", finished);
    }
    Ok(())
}

fn handle_stop(storage: &mut SqliteStorage, search_id: i64) -> Result<()> {
    let search = storage.get_search(search_id)?;
    if search.status.is_terminal() {
        println!("Search {} is already {}", search_id, search.status);
        return Ok(());
    }

    storage.update_search_status(search_id, SearchStatus::Stopped, None, None, None, None)?;
    println!("Stop requested for search {}", search_id);
    Ok(())
}

fn handle_results(storage: &SqliteStorage, search_id: i64) -> Result<()> {
    let results = collect_results(storage, search_id)?;

    println!(
        "Search {} ({}): {} emails, {} phones, {} businesses",
        search_id,
        results.search.status,
        results.emails.len(),
        results.phones.len(),
        results.businesses.len()
    );

    if !results.emails.is_empty() {
        println!("\nEmails:");
        for e in &results.emails {
            println!("  {}  ({})", e.email, e.source_url);
        }
    }
    if !results.phones.is_empty() {
        println!("\nPhones:");
        for p in &results.phones {
            println!("  {}  ({})", p.phone, p.source_url);
        }
    }
    if !results.businesses.is_empty() {
        println!("\nBusinesses:");
        for b in &results.businesses {
            println!(
                "  {}  {}  {}",
                b.record.name.as_deref().unwrap_or("(unnamed)"),
                b.record.phone.as_deref().unwrap_or("-"),
                b.record.website.as_deref().unwrap_or("-")
            );
        }
    }
    Ok(())
}

fn handle_history(storage: &SqliteStorage, limit: u32) -> Result<()> {
    let searches = storage.list_searches(limit)?;
    if searches.is_empty() {
        println!("No searches yet");
        return Ok(());
    }

    println!(
        "{:>5}  {:<10}  {:<7}  {:>6}  {:>7}  {}",
        "ID", "STATUS", "MODE", "PAGES", "RECORDS", "QUERY"
    );
    for s in searches {
        println!(
            "{:>5}  {:<10}  {:<7}  {:>6}  {:>7}  {}",
            s.id,
            s.status.to_db_string(),
            s.mode,
            s.pages_crawled,
            s.records_found,
            s.query
        );
    }
    Ok(())
}

fn handle_export(
    storage: &SqliteStorage,
    search_id: i64,
    format: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let format: ExportFormat = format.parse().map_err(anyhow::Error::msg)?;
    let results = collect_results(storage, search_id)?;

    let path = output.unwrap_or_else(|| {
        let extension = match format {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        };
        PathBuf::from(format!("results_{}.{}", search_id, extension))
    });

    results
        .write_to(format, &path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Exported search {} to {}", search_id, path.display());
    Ok(())
}

fn handle_delete(storage: &mut SqliteStorage, search_id: i64) -> Result<()> {
    // Verify the id before a silent no-op delete
    storage.get_search(search_id)?;
    storage.delete_search(search_id)?;
    println!("Deleted search {}", search_id);
    Ok(())
}
