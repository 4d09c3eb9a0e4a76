//! Fetch executor
//!
//! Retrieves and extracts single pages on demand, independently of any crawl
//! session: a cache in front, bounded retries with exponential backoff for
//! transient failures, and failures reported as values.

mod error_kind;
mod executor;
mod extract;

pub use crate::config::ScrapeOptions;
pub use error_kind::FetchErrorKind;
pub use executor::{backoff_delay, cache_key, is_retryable, FetchExecutor, FETCHER_ID, MAX_BACKOFF};
pub use extract::{
    extract_attachments, extract_document, extract_images, extract_tables, find_next_page,
    merge_page, ExtractedPage,
};
