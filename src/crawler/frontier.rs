use chrono::{DateTime, Utc};
use std::collections::{HashSet, VecDeque};
use url::Url;

use crate::url::site_key;

/// A URL waiting to be crawled
#[derive(Debug, Clone, PartialEq)]
pub struct FrontierEntry {
    /// Normalized URL
    pub url: Url,

    /// Id of the node that discovered this URL; None for the seed
    pub parent_id: Option<String>,

    /// Distance from the seed in link hops
    pub level: u32,

    pub discovered_at: DateTime<Utc>,
}

impl FrontierEntry {
    pub fn seed(url: Url) -> Self {
        Self {
            url,
            parent_id: None,
            level: 0,
            discovered_at: Utc::now(),
        }
    }
}

/// FIFO crawl queue with visited/queued deduplication
///
/// A URL enters the queue at most once per session: pushes of URLs that are
/// already queued or visited are dropped, so the first discoverer keeps the
/// parent attribution. URLs that differ only by a leading `www.` on the host
/// count as the same URL.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    queued: HashSet<String>,
    visited: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry; returns false if its URL is already known
    pub fn push(&mut self, entry: FrontierEntry) -> bool {
        let key = site_key(&entry.url);
        if self.visited.contains(&key) || self.queued.contains(&key) {
            return false;
        }
        self.queued.insert(key);
        self.queue.push_back(entry);
        true
    }

    /// Removes the oldest entry
    pub fn pop(&mut self) -> Option<FrontierEntry> {
        let entry = self.queue.pop_front()?;
        self.queued.remove(&site_key(&entry.url));
        Some(entry)
    }

    /// Marks a URL as visited; returns false if it already was
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(site_key(url))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
