//! Crawl statistics summary
//!
//! Combines the session counters with breakdowns computed from the recorded
//! nodes.

use crate::crawler::CrawlStats;
use crate::state::{CrawlStatus, NavigationNode, PageType};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Breakdowns of recorded nodes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeBreakdown {
    /// Successful nodes per page type
    pub by_page_type: BTreeMap<String, usize>,

    /// Recorded nodes per level
    pub by_level: BTreeMap<u32, usize>,

    /// Failed nodes per error message
    pub errors: BTreeMap<String, usize>,
}

impl NodeBreakdown {
    pub fn from_nodes(nodes: &[NavigationNode]) -> Self {
        let mut breakdown = Self::default();

        for node in nodes {
            *breakdown.by_level.entry(node.level).or_default() += 1;

            match node.crawl_status {
                CrawlStatus::Success => {
                    *breakdown
                        .by_page_type
                        .entry(node.page_type.to_string())
                        .or_default() += 1;
                }
                CrawlStatus::Failed => {
                    let error = node.error.clone().unwrap_or_else(|| "unknown error".to_string());
                    *breakdown.errors.entry(error).or_default() += 1;
                }
                CrawlStatus::Pending | CrawlStatus::Skipped => {}
            }
        }

        breakdown
    }

    pub fn count_of(&self, page_type: PageType) -> usize {
        self.by_page_type
            .get(page_type.to_db_string())
            .copied()
            .unwrap_or(0)
    }
}

/// Formats the statistics block printed after a crawl
pub fn format_statistics(stats: &CrawlStats, nodes: &[NavigationNode]) -> String {
    let breakdown = NodeBreakdown::from_nodes(nodes);
    let mut out = String::new();

    let _ = writeln!(out, "=== Crawl Statistics ===\n");

    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Pages discovered: {}", stats.pages_discovered);
    let _ = writeln!(out, "  Pages crawled: {}", stats.pages_crawled);
    let _ = writeln!(out, "  Pages failed: {}", stats.pages_failed);
    let _ = writeln!(out, "  Pages skipped: {}", stats.pages_skipped);
    let _ = writeln!(out, "  Max level reached: {}", stats.max_level_reached);
    let _ = writeln!(out, "  Duration: {}s", stats.duration().num_seconds());
    out.push('\n');

    if !breakdown.by_page_type.is_empty() {
        let _ = writeln!(out, "Pages by Type:");
        let mut types: Vec<_> = breakdown.by_page_type.iter().collect();
        types.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (page_type, count) in types {
            let _ = writeln!(
                out,
                "  {}: {} ({:.1}%)",
                page_type,
                count,
                percentage(*count, stats.pages_crawled)
            );
        }
        out.push('\n');
    }

    if !breakdown.by_level.is_empty() {
        let _ = writeln!(out, "Pages by Level:");
        for (level, count) in &breakdown.by_level {
            let _ = writeln!(out, "  {}: {}", level, count);
        }
        out.push('\n');
    }

    if !breakdown.errors.is_empty() {
        let _ = writeln!(out, "Error Summary:");
        let mut errors: Vec<_> = breakdown.errors.iter().collect();
        errors.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (error, count) in errors {
            let _ = writeln!(out, "  {}: {}", error, count);
        }
        out.push('\n');
    }

    let recorded = stats.pages_recorded();
    let _ = writeln!(
        out,
        "Success Rate: {:.1}% ({} / {} pages successfully crawled)",
        percentage(stats.pages_crawled, recorded),
        stats.pages_crawled,
        recorded
    );

    out
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &CrawlStats, nodes: &[NavigationNode]) {
    print!("{}", format_statistics(stats, nodes));
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
