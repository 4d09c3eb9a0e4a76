//! Database schema definitions
//!
//! Timestamps are RFC 3339 text. Node metadata and children are JSON text.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per crawl session
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    start_url TEXT NOT NULL,
    config_hash TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    status TEXT NOT NULL,
    stats TEXT
);

-- Navigation nodes recorded by a session, in visit order
CREATE TABLE IF NOT EXISTS nodes (
    session_id INTEGER NOT NULL REFERENCES sessions(id),
    position INTEGER NOT NULL,
    id TEXT NOT NULL,
    url TEXT NOT NULL,
    title TEXT NOT NULL,
    level INTEGER NOT NULL,
    parent_id TEXT,
    children TEXT NOT NULL,
    page_type TEXT NOT NULL,
    metadata TEXT NOT NULL,
    discovered_at TEXT NOT NULL,
    last_crawled TEXT,
    crawl_status TEXT NOT NULL,
    error TEXT,
    PRIMARY KEY (session_id, id)
);

CREATE INDEX IF NOT EXISTS idx_nodes_session_position ON nodes(session_id, position);
CREATE INDEX IF NOT EXISTS idx_nodes_url ON nodes(url);

-- Cache store entries
CREATE TABLE IF NOT EXISTS cache_entries (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cache_expires ON cache_entries(expires_at);
"#;

/// Creates every table and index that does not exist yet
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["sessions", "nodes", "cache_entries"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }
}
