//! SQLite storage implementation
//!
//! One connection behind a tokio mutex. Every method locks, runs its
//! statements synchronously and releases the lock without awaiting in
//! between.

use crate::cache::{CacheEntry, CacheStore};
use crate::crawler::CrawlStats;
use crate::state::{CrawlStatus, NavigationNode, PageType};
use crate::storage::schema::initialize_schema;
use crate::storage::{SessionRecord, SessionStatus};
use crate::ScoutError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::sync::Mutex;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

fn conversion_error(
    column: usize,
    error: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(error))
}

fn time_column(row: &Row<'_>, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

fn optional_time_column(row: &Row<'_>, column: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(column)? {
        Some(_) => time_column(row, column).map(Some),
        None => Ok(None),
    }
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, column: usize) -> rusqlite::Result<T> {
    let text: String = row.get(column)?;
    serde_json::from_str(&text).map_err(|e| conversion_error(column, e))
}

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
struct UnknownValue {
    kind: &'static str,
    value: String,
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    let status: String = row.get(5)?;
    let stats: Option<String> = row.get(6)?;

    Ok(SessionRecord {
        id: row.get(0)?,
        start_url: row.get(1)?,
        config_hash: row.get(2)?,
        started_at: time_column(row, 3)?,
        finished_at: optional_time_column(row, 4)?,
        status: SessionStatus::from_db_string(&status).ok_or_else(|| {
            conversion_error(
                5,
                UnknownValue {
                    kind: "session status",
                    value: status.clone(),
                },
            )
        })?,
        stats: match stats {
            Some(text) => Some(serde_json::from_str(&text).map_err(|e| conversion_error(6, e))?),
            None => None,
        },
    })
}

fn node_from_row(row: &Row<'_>) -> rusqlite::Result<NavigationNode> {
    let page_type: String = row.get(6)?;
    let crawl_status: String = row.get(10)?;

    Ok(NavigationNode {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        level: row.get(3)?,
        parent_id: row.get(4)?,
        children: json_column(row, 5)?,
        page_type: PageType::from_db_string(&page_type).ok_or_else(|| {
            conversion_error(
                6,
                UnknownValue {
                    kind: "page type",
                    value: page_type.clone(),
                },
            )
        })?,
        metadata: json_column(row, 7)?,
        discovered_at: time_column(row, 8)?,
        last_crawled: optional_time_column(row, 9)?,
        crawl_status: CrawlStatus::from_db_string(&crawl_status).ok_or_else(|| {
            conversion_error(
                10,
                UnknownValue {
                    kind: "crawl status",
                    value: crawl_status.clone(),
                },
            )
        })?,
        error: row.get(11)?,
    })
}

const SESSION_COLUMNS: &str =
    "id, start_url, config_hash, started_at, finished_at, status, stats";

impl SqliteStorage {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> crate::Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> crate::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // ===== Session Management =====

    /// Starts a session record and returns its id
    pub async fn create_session(&self, start_url: &str, config_hash: &str) -> crate::Result<i64> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO sessions (start_url, config_hash, started_at, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                start_url,
                config_hash,
                Utc::now().to_rfc3339(),
                SessionStatus::Running.to_db_string()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Stores `nodes` for a session, replacing nodes with the same id
    ///
    /// Positions continue after the nodes already stored, so repeated calls
    /// with successive batches keep the visit order.
    ///
    /// # Arguments
    ///
    /// * `session_id` - Id returned by `create_session`
    /// * `nodes` - Nodes in visit order
    ///
    /// # Returns
    ///
    /// `Ok(())` once every node is written in a single transaction
    pub async fn save_nodes(&self, session_id: i64, nodes: &[NavigationNode]) -> crate::Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let exists: Option<i64> = tx
            .query_row(
                "SELECT id FROM sessions WHERE id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(ScoutError::SessionNotFound(session_id));
        }

        let next_position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM nodes WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO nodes (session_id, position, id, url, title, level, parent_id, children,
                 page_type, metadata, discovered_at, last_crawled, crawl_status, error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                 ON CONFLICT(session_id, id) DO UPDATE SET
                    title = excluded.title,
                    children = excluded.children,
                    page_type = excluded.page_type,
                    metadata = excluded.metadata,
                    last_crawled = excluded.last_crawled,
                    crawl_status = excluded.crawl_status,
                    error = excluded.error",
            )?;

            for (offset, node) in nodes.iter().enumerate() {
                stmt.execute(params![
                    session_id,
                    next_position + offset as i64,
                    node.id,
                    node.url,
                    node.title,
                    node.level,
                    node.parent_id,
                    serde_json::to_string(&node.children)?,
                    node.page_type.to_db_string(),
                    serde_json::to_string(&node.metadata)?,
                    node.discovered_at.to_rfc3339(),
                    node.last_crawled.map(|t| t.to_rfc3339()),
                    node.crawl_status.to_db_string(),
                    node.error,
                ])?;
            }
        }

        tx.commit()?;
        tracing::debug!("Saved {} nodes for session {}", nodes.len(), session_id);
        Ok(())
    }

    /// Closes a session with its final status and counters
    pub async fn complete_session(
        &self,
        session_id: i64,
        status: SessionStatus,
        stats: &CrawlStats,
    ) -> crate::Result<()> {
        let finished_at = stats.finished_at.unwrap_or_else(Utc::now);
        let conn = self.conn.lock().await;
        let updated = conn.execute(
            "UPDATE sessions SET status = ?1, finished_at = ?2, stats = ?3 WHERE id = ?4",
            params![
                status.to_db_string(),
                finished_at.to_rfc3339(),
                serde_json::to_string(stats)?,
                session_id
            ],
        )?;
        if updated == 0 {
            return Err(ScoutError::SessionNotFound(session_id));
        }
        Ok(())
    }

    pub async fn get_session(&self, session_id: i64) -> crate::Result<SessionRecord> {
        let conn = self.conn.lock().await;
        conn.query_row(
            &format!("SELECT {} FROM sessions WHERE id = ?1", SESSION_COLUMNS),
            params![session_id],
            session_from_row,
        )
        .optional()?
        .ok_or(ScoutError::SessionNotFound(session_id))
    }

    /// Most recently started session
    pub async fn latest_session(&self) -> crate::Result<Option<SessionRecord>> {
        let conn = self.conn.lock().await;
        let session = conn
            .query_row(
                &format!(
                    "SELECT {} FROM sessions ORDER BY id DESC LIMIT 1",
                    SESSION_COLUMNS
                ),
                [],
                session_from_row,
            )
            .optional()?;
        Ok(session)
    }

    /// Nodes of a session in visit order
    pub async fn load_nodes(&self, session_id: i64) -> crate::Result<Vec<NavigationNode>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, url, title, level, parent_id, children, page_type, metadata,
             discovered_at, last_crawled, crawl_status, error
             FROM nodes WHERE session_id = ?1 ORDER BY position",
        )?;
        let nodes = stmt
            .query_map(params![session_id], node_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    pub async fn count_nodes(&self, session_id: i64) -> crate::Result<u64> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM nodes WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Cache Maintenance =====

    /// Deletes expired cache entries, returning how many were removed
    pub async fn purge_expired_cache(&self) -> crate::Result<usize> {
        let conn = self.conn.lock().await;
        let removed = conn.execute(
            "DELETE FROM cache_entries WHERE expires_at <= ?1",
            params![Utc::now().to_rfc3339()],
        )?;
        Ok(removed)
    }
}

#[async_trait]
impl CacheStore for SqliteStorage {
    async fn get(&self, key: &str) -> crate::Result<Option<CacheEntry>> {
        let conn = self.conn.lock().await;
        let entry = conn
            .query_row(
                "SELECT value, expires_at FROM cache_entries WHERE key = ?1",
                params![key],
                |row| {
                    Ok(CacheEntry {
                        value: json_column(row, 0)?,
                        expires_at: time_column(row, 1)?,
                    })
                },
            )
            .optional()?;

        match entry {
            Some(entry) if entry.is_expired() => {
                conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn set(&self, key: &str, value: serde_json::Value, ttl_secs: u64) -> crate::Result<()> {
        let entry = CacheEntry::new(value, ttl_secs);
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO cache_entries (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
            params![
                key,
                serde_json::to_string(&entry.value)?,
                entry.expires_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> crate::Result<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
        Ok(())
    }

    async fn clear(&self) -> crate::Result<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM cache_entries", [])?;
        Ok(())
    }
}
