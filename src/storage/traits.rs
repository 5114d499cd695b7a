//! Storage trait and error types

use crate::storage::{
    BusinessMeta, BusinessRecord, BusinessRow, EmailRecord, PhoneRecord, SearchRecord,
    SearchStatus,
};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Search not found: {0}")]
    SearchNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for the progress sink backing a search run
///
/// Implementations must make `add_email`/`add_phone` idempotent per
/// `(search_id, value)` pair and must never let a terminal search status be
/// overwritten. The run controller holds the store behind a mutex; methods
/// take `&mut self` and need not be internally synchronized.
pub trait SearchStore: Send {
    // ===== Search lifecycle =====

    /// Creates a new search record with status `running`, returning its id
    fn create_search(&mut self, query: &str, mode: &str) -> StorageResult<i64>;

    /// Gets a search by id
    fn get_search(&self, search_id: i64) -> StorageResult<SearchRecord>;

    /// Updates status and counters for a search
    ///
    /// `None` counter arguments leave the stored value untouched. The status
    /// column only changes while the stored status is still `running`;
    /// writing a terminal status also stamps `completed_at` and clears
    /// `current_url`.
    fn update_search_status(
        &mut self,
        search_id: i64,
        status: SearchStatus,
        pages_crawled: Option<u64>,
        records_found: Option<u64>,
        current_url: Option<&str>,
        error_message: Option<&str>,
    ) -> StorageResult<()>;

    /// Lists recent searches, newest first
    fn list_searches(&self, limit: u32) -> StorageResult<Vec<SearchRecord>>;

    /// Deletes a search and all associated rows
    fn delete_search(&mut self, search_id: i64) -> StorageResult<()>;

    // ===== Extracted records =====

    /// Stores an email; returns false if this search already has it
    fn add_email(
        &mut self,
        search_id: i64,
        email: &str,
        source_url: &str,
        domain: Option<&str>,
        meta: &BusinessMeta,
    ) -> StorageResult<bool>;

    /// Stores a phone number; returns false if this search already has it
    fn add_phone(
        &mut self,
        search_id: i64,
        phone: &str,
        source_url: &str,
        meta: &BusinessMeta,
    ) -> StorageResult<bool>;

    /// Stores a business record from a listing search
    fn add_business(
        &mut self,
        search_id: i64,
        record: &BusinessRecord,
        source: &str,
    ) -> StorageResult<bool>;

    fn get_emails(&self, search_id: i64) -> StorageResult<Vec<EmailRecord>>;

    fn get_phones(&self, search_id: i64) -> StorageResult<Vec<PhoneRecord>>;

    fn get_businesses(&self, search_id: i64) -> StorageResult<Vec<BusinessRow>>;

    // ===== Crawled-URL tracking =====

    /// Marks a URL as fetched for this search
    fn mark_url_crawled(&mut self, search_id: i64, url: &str) -> StorageResult<()>;

    /// Checks whether a URL was already fetched for this search
    fn is_url_crawled(&self, search_id: i64, url: &str) -> StorageResult<bool>;
}
