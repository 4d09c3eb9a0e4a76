use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters of one crawl session
///
/// `pages_crawled + pages_failed + pages_skipped <= pages_discovered` holds at
/// every step: URLs still queued when the session ends are discovered but not
/// counted anywhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlStats {
    /// Unique URLs that entered the queue, seed included
    pub pages_discovered: usize,

    /// Successfully crawled pages
    pub pages_crawled: usize,
    pub pages_failed: usize,

    /// URLs rejected by patterns, scope or robots.txt
    pub pages_skipped: usize,

    /// Deepest level of a recorded node
    pub max_level_reached: u32,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self {
            pages_discovered: 0,
            pages_crawled: 0,
            pages_failed: 0,
            pages_skipped: 0,
            max_level_reached: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Nodes recorded so far (successful and failed)
    pub fn pages_recorded(&self) -> usize {
        self.pages_crawled + self.pages_failed
    }

    /// Wall-clock duration, up to now for a running session
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}
