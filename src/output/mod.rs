//! Output module for crawl summaries and exports
//!
//! This module handles:
//! - Rebuilding the navigation tree from recorded nodes
//! - Printing crawl statistics
//! - Exporting crawl and fetch results as JSON

pub mod stats;
mod tree;

pub use stats::{format_statistics, print_statistics, NodeBreakdown};
pub use tree::{NavigationTree, TreeNode};

use crate::crawler::CrawlStats;
use crate::state::NavigationNode;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// JSON document written by `write_json` for a crawl
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlExport<'a> {
    pub session_id: Option<i64>,
    pub stats: &'a CrawlStats,
    pub nodes: &'a [NavigationNode],
}

/// Writes `value` as pretty-printed JSON to `path`
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> crate::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use url::Url;

    #[test]
    fn test_write_crawl_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crawl.json");

        let node = NavigationNode::pending(
            &Url::parse("https://a.go.kr/").unwrap(),
            0,
            None,
            Utc::now(),
        );
        let stats = CrawlStats::new();
        let export = CrawlExport {
            session_id: Some(7),
            stats: &stats,
            nodes: std::slice::from_ref(&node),
        };
        write_json(&path, &export).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["sessionId"], 7);
        assert_eq!(json["nodes"][0]["url"], "https://a.go.kr/");
        assert_eq!(json["nodes"][0]["crawlStatus"], "pending");
        assert_eq!(json["stats"]["pagesCrawled"], 0);
    }
}
