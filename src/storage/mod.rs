//! Storage module for persisting search progress and extracted contacts
//!
//! This module is the progress sink of the crawler: it records per-search
//! status and counters (pollable at any time, including from other
//! processes), deduplicates extracted emails and phones per search, and
//! remembers which URLs were already fetched.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{SearchStore, StorageError, StorageResult};

/// One search run as persisted in the `searches` table
#[derive(Debug, Clone)]
pub struct SearchRecord {
    pub id: i64,
    pub query: String,
    pub mode: String,
    pub status: SearchStatus,
    pub pages_crawled: u64,
    pub records_found: u64,
    pub current_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

/// Status of a search run
///
/// `Running` is the only non-terminal status. Once a search reaches
/// `Completed`, `Stopped`, or `Error`, the status column never changes again
/// (enforced by the store).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Running,
    Completed,
    Stopped,
    Error,
}

impl SearchStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::Error => "error",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "stopped" => Some(Self::Stopped),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Whether this status is final
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl std::fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// Optional business context attached to an extracted email or phone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusinessMeta {
    pub business_name: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
}

/// A structured business record from a listing-search capability
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusinessRecord {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
}

impl BusinessRecord {
    /// Business context carried onto the email/phone rows this record feeds
    pub fn meta(&self) -> BusinessMeta {
        BusinessMeta {
            business_name: self.name.clone(),
            website: self.website.clone(),
            address: self.address.clone(),
        }
    }
}

/// A stored email row
#[derive(Debug, Clone)]
pub struct EmailRecord {
    pub email: String,
    pub source_url: String,
    pub domain: Option<String>,
    pub meta: BusinessMeta,
    pub found_at: String,
}

/// A stored phone row
#[derive(Debug, Clone)]
pub struct PhoneRecord {
    pub phone: String,
    pub source_url: String,
    pub meta: BusinessMeta,
    pub found_at: String,
}

/// A stored business row with its provenance
#[derive(Debug, Clone)]
pub struct BusinessRow {
    pub record: BusinessRecord,
    pub source: String,
    pub found_at: String,
}
