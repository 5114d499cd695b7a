//! URL handling: normalization, link resolution, and domain extraction
//!
//! The frontier deduplicates by exact URL string, so everything that enqueues
//! a URL routes it through [`normalize_url`] (or [`resolve_link`] for hrefs
//! found on pages) first.

mod domain;
mod normalize;

pub use domain::extract_domain;
pub use normalize::{normalize_url, resolve_link};
