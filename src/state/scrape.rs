//! Documents and results produced by the fetch executor

use crate::state::{PageMetadata, PageType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An image referenced by a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
    pub alt: Option<String>,
}

/// A downloadable file linked from a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub name: String,
    pub extension: Option<String>,
}

/// A table extracted as rows of cell text
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    pub caption: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A retrieved page and everything extracted from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedDocument {
    pub url: String,
    pub title: String,
    pub content: String,
    pub page_type: PageType,
    pub metadata: PageMetadata,
    pub links: Vec<String>,
    pub images: Vec<ImageRef>,
    pub attachments: Vec<Attachment>,
    pub tables: Vec<Table>,
    pub page_count: u32,
    pub scraped_at: DateTime<Utc>,
}

/// Outcome of one fetch executor invocation
///
/// Failure is a value, not an error: `success == false` carries the message of
/// the last attempt. A result is never mutated after it is returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub success: bool,
    pub url: String,
    pub document: Option<ScrapedDocument>,
    pub error: Option<String>,
    pub execution_time_ms: u64,
    pub retry_count: u32,
    #[serde(default)]
    pub from_cache: bool,
}

impl ScrapeResult {
    pub fn succeeded(
        url: impl Into<String>,
        document: ScrapedDocument,
        execution_time_ms: u64,
        retry_count: u32,
    ) -> Self {
        Self {
            success: true,
            url: url.into(),
            document: Some(document),
            error: None,
            execution_time_ms,
            retry_count,
            from_cache: false,
        }
    }

    pub fn failed(
        url: impl Into<String>,
        error: impl Into<String>,
        execution_time_ms: u64,
        retry_count: u32,
    ) -> Self {
        Self {
            success: false,
            url: url.into(),
            document: None,
            error: Some(error.into()),
            execution_time_ms,
            retry_count,
            from_cache: false,
        }
    }
}
