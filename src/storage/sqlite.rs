//! SQLite storage implementation

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{SearchStore, StorageError, StorageResult};
use crate::storage::{
    BusinessMeta, BusinessRecord, BusinessRow, EmailRecord, PhoneRecord, SearchRecord,
    SearchStatus,
};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database file and initializes the schema
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn row_to_search(row: &Row<'_>) -> rusqlite::Result<SearchRecord> {
        Ok(SearchRecord {
            id: row.get(0)?,
            query: row.get(1)?,
            mode: row.get(2)?,
            status: SearchStatus::from_db_string(&row.get::<_, String>(3)?)
                .unwrap_or(SearchStatus::Error),
            pages_crawled: row.get::<_, i64>(4)? as u64,
            records_found: row.get::<_, i64>(5)? as u64,
            current_url: row.get(6)?,
            error_message: row.get(7)?,
            created_at: row.get(8)?,
            completed_at: row.get(9)?,
        })
    }
}

const SEARCH_COLUMNS: &str = "id, query, mode, status, pages_crawled, records_found, \
     current_url, error_message, created_at, completed_at";

impl SearchStore for SqliteStorage {
    fn create_search(&mut self, query: &str, mode: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO searches (query, mode, status, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![query, mode, SearchStatus::Running.to_db_string(), now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_search(&self, search_id: i64) -> StorageResult<SearchRecord> {
        let sql = format!("SELECT {} FROM searches WHERE id = ?1", SEARCH_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;

        stmt.query_row(params![search_id], Self::row_to_search)
            .map_err(|_| StorageError::SearchNotFound(search_id))
    }

    fn update_search_status(
        &mut self,
        search_id: i64,
        status: SearchStatus,
        pages_crawled: Option<u64>,
        records_found: Option<u64>,
        current_url: Option<&str>,
        error_message: Option<&str>,
    ) -> StorageResult<()> {
        // The status column only moves while it is still 'running'; a
        // terminal write also stamps completed_at and clears current_url.
        let now = Utc::now().to_rfc3339();
        let terminal = status.is_terminal();
        let changed = self.conn.execute(
            "UPDATE searches SET
                 status = CASE WHEN status = 'running' THEN ?2 ELSE status END,
                 pages_crawled = COALESCE(?3, pages_crawled),
                 records_found = COALESCE(?4, records_found),
                 current_url = CASE WHEN ?5 THEN NULL ELSE COALESCE(?6, current_url) END,
                 error_message = COALESCE(?7, error_message),
                 completed_at = CASE
                     WHEN ?5 AND completed_at IS NULL THEN ?8
                     ELSE completed_at
                 END
             WHERE id = ?1",
            params![
                search_id,
                status.to_db_string(),
                pages_crawled.map(|v| v as i64),
                records_found.map(|v| v as i64),
                terminal,
                current_url,
                error_message,
                now
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::SearchNotFound(search_id));
        }
        Ok(())
    }

    fn list_searches(&self, limit: u32) -> StorageResult<Vec<SearchRecord>> {
        let sql = format!(
            "SELECT {} FROM searches ORDER BY id DESC LIMIT ?1",
            SEARCH_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit], Self::row_to_search)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn delete_search(&mut self, search_id: i64) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM searches WHERE id = ?1", params![search_id])?;
        Ok(())
    }

    fn add_email(
        &mut self,
        search_id: i64,
        email: &str,
        source_url: &str,
        domain: Option<&str>,
        meta: &BusinessMeta,
    ) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO emails
                 (search_id, email, source_url, domain, business_name, website, address, found_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                search_id,
                email,
                source_url,
                domain,
                meta.business_name,
                meta.website,
                meta.address,
                now
            ],
        )?;
        Ok(changed > 0)
    }

    fn add_phone(
        &mut self,
        search_id: i64,
        phone: &str,
        source_url: &str,
        meta: &BusinessMeta,
    ) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO phones
                 (search_id, phone, source_url, business_name, website, address, found_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                search_id,
                phone,
                source_url,
                meta.business_name,
                meta.website,
                meta.address,
                now
            ],
        )?;
        Ok(changed > 0)
    }

    fn add_business(
        &mut self,
        search_id: i64,
        record: &BusinessRecord,
        source: &str,
    ) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "INSERT INTO businesses
                 (search_id, name, phone, email, address, website, rating, review_count,
                  source, found_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                search_id,
                record.name,
                record.phone,
                record.email,
                record.address,
                record.website,
                record.rating,
                record.review_count,
                source,
                now
            ],
        )?;
        Ok(changed > 0)
    }

    fn get_emails(&self, search_id: i64) -> StorageResult<Vec<EmailRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT email, source_url, domain, business_name, website, address, found_at
             FROM emails WHERE search_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![search_id], |row| {
            Ok(EmailRecord {
                email: row.get(0)?,
                source_url: row.get(1)?,
                domain: row.get(2)?,
                meta: BusinessMeta {
                    business_name: row.get(3)?,
                    website: row.get(4)?,
                    address: row.get(5)?,
                },
                found_at: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn get_phones(&self, search_id: i64) -> StorageResult<Vec<PhoneRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT phone, source_url, business_name, website, address, found_at
             FROM phones WHERE search_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![search_id], |row| {
            Ok(PhoneRecord {
                phone: row.get(0)?,
                source_url: row.get(1)?,
                meta: BusinessMeta {
                    business_name: row.get(2)?,
                    website: row.get(3)?,
                    address: row.get(4)?,
                },
                found_at: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn get_businesses(&self, search_id: i64) -> StorageResult<Vec<BusinessRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, phone, email, address, website, rating, review_count, source, found_at
             FROM businesses WHERE search_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![search_id], |row| {
            Ok(BusinessRow {
                record: BusinessRecord {
                    name: row.get(0)?,
                    phone: row.get(1)?,
                    email: row.get(2)?,
                    address: row.get(3)?,
                    website: row.get(4)?,
                    rating: row.get(5)?,
                    review_count: row.get(6)?,
                },
                source: row.get(7)?,
                found_at: row.get(8)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn mark_url_crawled(&mut self, search_id: i64, url: &str) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR IGNORE INTO crawled_urls (search_id, url, crawled_at) VALUES (?1, ?2, ?3)",
            params![search_id, url, now],
        )?;
        Ok(())
    }

    fn is_url_crawled(&self, search_id: i64, url: &str) -> StorageResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM crawled_urls WHERE search_id = ?1 AND url = ?2",
            params![search_id, url],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStorage {
        SqliteStorage::new_in_memory().unwrap()
    }

    #[test]
    fn test_create_and_get_search() {
        let mut store = store();
        let id = store.create_search("plumbers in austin", "web").unwrap();

        let search = store.get_search(id).unwrap();
        assert_eq!(search.query, "plumbers in austin");
        assert_eq!(search.mode, "web");
        assert_eq!(search.status, SearchStatus::Running);
        assert_eq!(search.pages_crawled, 0);
        assert!(search.completed_at.is_none());
    }

    #[test]
    fn test_get_missing_search() {
        let store = store();
        assert!(matches!(
            store.get_search(99),
            Err(StorageError::SearchNotFound(99))
        ));
    }

    #[test]
    fn test_status_update_and_counters() {
        let mut store = store();
        let id = store.create_search("q", "web").unwrap();

        store
            .update_search_status(
                id,
                SearchStatus::Running,
                Some(5),
                Some(2),
                Some("https://a.test/"),
                None,
            )
            .unwrap();

        let search = store.get_search(id).unwrap();
        assert_eq!(search.pages_crawled, 5);
        assert_eq!(search.records_found, 2);
        assert_eq!(search.current_url.as_deref(), Some("https://a.test/"));
    }

    #[test]
    fn test_terminal_status_is_never_overwritten() {
        let mut store = store();
        let id = store.create_search("q", "web").unwrap();

        // External caller stops the search...
        store
            .update_search_status(id, SearchStatus::Stopped, None, None, None, None)
            .unwrap();

        // ...and a late completion write must not change the status
        store
            .update_search_status(id, SearchStatus::Completed, Some(10), Some(3), None, None)
            .unwrap();

        let search = store.get_search(id).unwrap();
        assert_eq!(search.status, SearchStatus::Stopped);
        // Counters still land
        assert_eq!(search.pages_crawled, 10);
        assert!(search.completed_at.is_some());
    }

    #[test]
    fn test_terminal_write_clears_current_url() {
        let mut store = store();
        let id = store.create_search("q", "web").unwrap();

        store
            .update_search_status(
                id,
                SearchStatus::Running,
                Some(1),
                None,
                Some("https://a.test/"),
                None,
            )
            .unwrap();
        store
            .update_search_status(id, SearchStatus::Completed, None, None, None, None)
            .unwrap();

        let search = store.get_search(id).unwrap();
        assert_eq!(search.status, SearchStatus::Completed);
        assert!(search.current_url.is_none());
    }

    #[test]
    fn test_add_email_idempotent() {
        let mut store = store();
        let id = store.create_search("q", "web").unwrap();
        let meta = BusinessMeta::default();

        assert!(store
            .add_email(id, "x@a.test", "https://a.test/", Some("a.test"), &meta)
            .unwrap());
        assert!(!store
            .add_email(id, "x@a.test", "https://a.test/other", Some("a.test"), &meta)
            .unwrap());

        assert_eq!(store.get_emails(id).unwrap().len(), 1);
    }

    #[test]
    fn test_same_email_different_search_allowed() {
        let mut store = store();
        let a = store.create_search("one", "web").unwrap();
        let b = store.create_search("two", "web").unwrap();
        let meta = BusinessMeta::default();

        assert!(store
            .add_email(a, "x@a.test", "https://a.test/", None, &meta)
            .unwrap());
        assert!(store
            .add_email(b, "x@a.test", "https://a.test/", None, &meta)
            .unwrap());
    }

    #[test]
    fn test_add_phone_idempotent() {
        let mut store = store();
        let id = store.create_search("q", "web").unwrap();
        let meta = BusinessMeta::default();

        assert!(store
            .add_phone(id, "555-555-0123", "https://a.test/", &meta)
            .unwrap());
        assert!(!store
            .add_phone(id, "555-555-0123", "https://a.test/", &meta)
            .unwrap());
    }

    #[test]
    fn test_add_business_with_meta() {
        let mut store = store();
        let id = store.create_search("q", "maps").unwrap();

        let record = BusinessRecord {
            name: Some("Acme Plumbing".to_string()),
            phone: Some("555-555-0100".to_string()),
            address: Some("1 Main St".to_string()),
            website: Some("https://acme.test".to_string()),
            rating: Some(4.5),
            review_count: Some(120),
            ..Default::default()
        };
        assert!(store.add_business(id, &record, "Google Maps").unwrap());

        let rows = store.get_businesses(id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].source, "Google Maps");
        assert_eq!(rows[0].record.name.as_deref(), Some("Acme Plumbing"));
    }

    #[test]
    fn test_crawled_url_tracking() {
        let mut store = store();
        let id = store.create_search("q", "web").unwrap();

        assert!(!store.is_url_crawled(id, "https://a.test/").unwrap());
        store.mark_url_crawled(id, "https://a.test/").unwrap();
        assert!(store.is_url_crawled(id, "https://a.test/").unwrap());

        // Re-marking is not an error
        store.mark_url_crawled(id, "https://a.test/").unwrap();
    }

    #[test]
    fn test_list_searches_newest_first() {
        let mut store = store();
        store.create_search("first", "web").unwrap();
        store.create_search("second", "web").unwrap();

        let searches = store.list_searches(10).unwrap();
        assert_eq!(searches.len(), 2);
        assert_eq!(searches[0].query, "second");
    }

    #[test]
    fn test_delete_search_cascades() {
        let mut store = store();
        let id = store.create_search("q", "web").unwrap();
        store
            .add_email(id, "x@a.test", "https://a.test/", None, &BusinessMeta::default())
            .unwrap();

        store.delete_search(id).unwrap();
        assert!(store.get_search(id).is_err());
        assert!(store.get_emails(id).unwrap().is_empty());
    }
}
