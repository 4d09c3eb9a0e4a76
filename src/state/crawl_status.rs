/// Crawl status definitions for navigation nodes
///
/// This module defines every state a URL can be in during one crawl session.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the crawl status of a navigation node
///
/// `Pending` is the only active state. `Success` and `Failed` are terminal and
/// append-only: once a node reaches them it is never fetched again within the
/// same crawl session. `Skipped` is terminal as well but never produces a
/// recorded node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStatus {
    /// Discovered and queued, not yet fetched
    Pending,

    /// Fetched and extracted
    Success,

    /// Fetch or extraction failed; the error is recorded on the node
    Failed,

    /// Rejected by a filter, robots.txt or the domain scope
    Skipped,
}

impl CrawlStatus {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
