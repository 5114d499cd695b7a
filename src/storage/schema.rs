//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the leadtrawl
//! database.

use rusqlite::Connection;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per search run
CREATE TABLE IF NOT EXISTS searches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    query TEXT NOT NULL,
    mode TEXT NOT NULL,
    status TEXT NOT NULL,
    pages_crawled INTEGER NOT NULL DEFAULT 0,
    records_found INTEGER NOT NULL DEFAULT 0,
    current_url TEXT,
    error_message TEXT,
    created_at TEXT NOT NULL,
    completed_at TEXT
);

-- Extracted email addresses, unique per search
CREATE TABLE IF NOT EXISTS emails (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    search_id INTEGER NOT NULL REFERENCES searches(id) ON DELETE CASCADE,
    email TEXT NOT NULL,
    source_url TEXT NOT NULL,
    domain TEXT,
    business_name TEXT,
    website TEXT,
    address TEXT,
    found_at TEXT NOT NULL,
    UNIQUE(search_id, email)
);

CREATE INDEX IF NOT EXISTS idx_emails_search ON emails(search_id);

-- Extracted phone numbers, unique per search
CREATE TABLE IF NOT EXISTS phones (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    search_id INTEGER NOT NULL REFERENCES searches(id) ON DELETE CASCADE,
    phone TEXT NOT NULL,
    source_url TEXT NOT NULL,
    business_name TEXT,
    website TEXT,
    address TEXT,
    found_at TEXT NOT NULL,
    UNIQUE(search_id, phone)
);

CREATE INDEX IF NOT EXISTS idx_phones_search ON phones(search_id);

-- Structured business records from listing-mode searches
CREATE TABLE IF NOT EXISTS businesses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    search_id INTEGER NOT NULL REFERENCES searches(id) ON DELETE CASCADE,
    name TEXT,
    phone TEXT,
    email TEXT,
    address TEXT,
    website TEXT,
    rating REAL,
    review_count INTEGER,
    source TEXT NOT NULL,
    found_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_businesses_search ON businesses(search_id);

-- URLs already fetched, for cross-run resumability checks
CREATE TABLE IF NOT EXISTS crawled_urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    search_id INTEGER NOT NULL REFERENCES searches(id) ON DELETE CASCADE,
    url TEXT NOT NULL,
    crawled_at TEXT NOT NULL,
    UNIQUE(search_id, url)
);

CREATE INDEX IF NOT EXISTS idx_crawled_urls_search ON crawled_urls(search_id);
"#;

/// Creates all tables and indexes if they do not exist
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
