//! Result export
//!
//! Collects everything stored for one search and renders it as CSV (section
//! per record kind, matching the web-UI download format) or JSON.

use crate::storage::{SearchStore, StorageResult};
use crate::storage::{BusinessRow, EmailRecord, PhoneRecord, SearchRecord};
use serde_json::json;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// Export output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("invalid format: {} (use csv or json)", other)),
        }
    }
}

/// Everything stored for one search
pub struct SearchResults {
    pub search: SearchRecord,
    pub emails: Vec<EmailRecord>,
    pub phones: Vec<PhoneRecord>,
    pub businesses: Vec<BusinessRow>,
}

/// Loads a search and all of its records from the store
pub fn collect_results(store: &dyn SearchStore, search_id: i64) -> StorageResult<SearchResults> {
    Ok(SearchResults {
        search: store.get_search(search_id)?,
        emails: store.get_emails(search_id)?,
        phones: store.get_phones(search_id)?,
        businesses: store.get_businesses(search_id)?,
    })
}

impl SearchResults {
    pub fn render(&self, format: ExportFormat) -> String {
        match format {
            ExportFormat::Csv => self.to_csv(),
            ExportFormat::Json => self.to_json().to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "search": {
                "id": self.search.id,
                "query": self.search.query,
                "mode": self.search.mode,
                "status": self.search.status.to_db_string(),
                "pages_crawled": self.search.pages_crawled,
                "records_found": self.search.records_found,
                "error_message": self.search.error_message,
                "created_at": self.search.created_at,
                "completed_at": self.search.completed_at,
            },
            "emails": self.emails.iter().map(|e| json!({
                "email": e.email,
                "domain": e.domain,
                "source_url": e.source_url,
                "business_name": e.meta.business_name,
                "website": e.meta.website,
                "address": e.meta.address,
                "found_at": e.found_at,
            })).collect::<Vec<_>>(),
            "phones": self.phones.iter().map(|p| json!({
                "phone": p.phone,
                "source_url": p.source_url,
                "business_name": p.meta.business_name,
                "website": p.meta.website,
                "address": p.meta.address,
                "found_at": p.found_at,
            })).collect::<Vec<_>>(),
            "businesses": self.businesses.iter().map(|b| json!({
                "name": b.record.name,
                "phone": b.record.phone,
                "email": b.record.email,
                "address": b.record.address,
                "website": b.record.website,
                "rating": b.record.rating,
                "review_count": b.record.review_count,
                "source": b.source,
                "found_at": b.found_at,
            })).collect::<Vec<_>>(),
        })
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::new();

        out.push_str("--- EMAILS ---\n");
        out.push_str("Email,Domain,Source URL,Found At\n");
        for e in &self.emails {
            csv_row(
                &mut out,
                &[
                    &e.email,
                    e.domain.as_deref().unwrap_or(""),
                    &e.source_url,
                    &e.found_at,
                ],
            );
        }

        out.push('\n');
        out.push_str("--- PHONES ---\n");
        out.push_str("Phone,Source URL,Found At\n");
        for p in &self.phones {
            csv_row(&mut out, &[&p.phone, &p.source_url, &p.found_at]);
        }

        out.push('\n');
        out.push_str("--- BUSINESSES ---\n");
        out.push_str("Name,Phone,Email,Address,Website,Rating,Source,Found At\n");
        for b in &self.businesses {
            let rating = b
                .record
                .rating
                .map(|r| r.to_string())
                .unwrap_or_default();
            csv_row(
                &mut out,
                &[
                    b.record.name.as_deref().unwrap_or(""),
                    b.record.phone.as_deref().unwrap_or(""),
                    b.record.email.as_deref().unwrap_or(""),
                    b.record.address.as_deref().unwrap_or(""),
                    b.record.website.as_deref().unwrap_or(""),
                    &rating,
                    &b.source,
                    &b.found_at,
                ],
            );
        }

        out
    }

    /// Writes the rendered export to a file
    pub fn write_to(&self, format: ExportFormat, path: &Path) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(self.render(format).as_bytes())
    }
}

fn csv_row(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&csv_escape(field));
    }
    out.push('\n');
}

/// Quotes a field if it contains a comma, quote, or newline
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
