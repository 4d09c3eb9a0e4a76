//! Navigation node records produced by the crawler

use crate::state::CrawlStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

/// Classification of a crawled page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    Homepage,
    Category,
    Content,
    List,
    Search,
    Unknown,
}

impl PageType {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Homepage => "homepage",
            Self::Category => "category",
            Self::Content => "content",
            Self::List => "list",
            Self::Search => "search",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "homepage" => Some(Self::Homepage),
            "category" => Some(Self::Category),
            "content" => Some(Self::Content),
            "list" => Some(Self::List),
            "search" => Some(Self::Search),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// Dominant script of a page's visible text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "ko-en")]
    Mixed,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Korean => "ko",
            Self::Mixed => "ko-en",
            Self::English => "en",
            Self::Unknown => "unknown",
        }
    }
}

/// Page-level facts extracted alongside a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub breadcrumb: Vec<String>,
    pub category: Option<String>,
    pub last_modified: Option<NaiveDate>,
    pub content_length: Option<usize>,
    pub has_images: bool,
    pub has_attachments: bool,
    pub has_table: bool,
    pub language: Language,
}

impl Default for PageMetadata {
    fn default() -> Self {
        Self {
            breadcrumb: Vec::new(),
            category: None,
            last_modified: None,
            content_length: None,
            has_images: false,
            has_attachments: false,
            has_table: false,
            language: Language::Unknown,
        }
    }
}

/// Durable record of one visited URL
///
/// Nodes form a tree through `parent_id`: the seed sits at level 0 and every
/// child is exactly one level below its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationNode {
    pub id: String,
    pub url: String,
    pub title: String,
    pub level: u32,
    pub parent_id: Option<String>,
    pub children: Vec<String>,
    pub page_type: PageType,
    pub metadata: PageMetadata,
    pub discovered_at: DateTime<Utc>,
    pub last_crawled: Option<DateTime<Utc>>,
    pub crawl_status: CrawlStatus,
    pub error: Option<String>,
}

impl NavigationNode {
    /// Creates a pending node for a normalized URL
    pub fn pending(
        url: &Url,
        level: u32,
        parent_id: Option<String>,
        discovered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: node_id_for(url),
            url: url.to_string(),
            title: String::new(),
            level,
            parent_id,
            children: Vec::new(),
            page_type: PageType::Unknown,
            metadata: PageMetadata::default(),
            discovered_at,
            last_crawled: None,
            crawl_status: CrawlStatus::Pending,
            error: None,
        }
    }

    /// Moves the node to `Failed`, recording the error
    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.crawl_status = CrawlStatus::Failed;
        self.error = Some(error.into());
        self.last_crawled = Some(Utc::now());
        self
    }
}

/// Derives a stable node id from a normalized URL
///
/// The id is the first 16 hex characters of the SHA-256 digest of the URL, so
/// the same page gets the same id across sessions.
pub fn node_id_for(url: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_str().as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_is_stable() {
        let url = Url::parse("https://example.go.kr/a").unwrap();
        assert_eq!(node_id_for(&url), node_id_for(&url));
        assert_eq!(node_id_for(&url).len(), 16);
    }

    #[test]
    fn test_node_id_differs_per_url() {
        let a = Url::parse("https://example.go.kr/a").unwrap();
        let b = Url::parse("https://example.go.kr/b").unwrap();
        assert_ne!(node_id_for(&a), node_id_for(&b));
    }

    #[test]
    fn test_pending_node() {
        let url = Url::parse("https://example.go.kr/").unwrap();
        let node = NavigationNode::pending(&url, 0, None, Utc::now());
        assert_eq!(node.crawl_status, CrawlStatus::Pending);
        assert_eq!(node.level, 0);
        assert!(node.parent_id.is_none());
        assert_eq!(node.page_type, PageType::Unknown);
    }

    #[test]
    fn test_fail_records_error() {
        let url = Url::parse("https://example.go.kr/").unwrap();
        let node = NavigationNode::pending(&url, 0, None, Utc::now()).fail("HTTP 500");
        assert_eq!(node.crawl_status, CrawlStatus::Failed);
        assert_eq!(node.error.as_deref(), Some("HTTP 500"));
        assert!(node.last_crawled.is_some());
    }

    #[test]
    fn test_language_serializes_as_code() {
        let json = serde_json::to_string(&Language::Mixed).unwrap();
        assert_eq!(json, "\"ko-en\"");
        assert_eq!(Language::Korean.code(), "ko");
    }
}
