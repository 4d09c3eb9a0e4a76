//! Storage module for persisting crawl sessions and cache entries
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Crawl session records and their navigation nodes
//! - The SQLite-backed `CacheStore`

mod schema;
mod sqlite;

pub use sqlite::SqliteStorage;

use crate::crawler::CrawlStats;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> crate::Result<SqliteStorage> {
    SqliteStorage::new(path)
}

/// A persisted crawl session
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: i64,
    pub start_url: String,
    pub config_hash: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub stats: Option<CrawlStats>,
}

/// Status of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl SessionStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
