//! Robots.txt handling module
//!
//! This module fetches, parses and caches robots.txt files. The politeness
//! governor owns the cache; everything here is stateless.

mod cache;
mod matcher;
mod parser;

pub use cache::CachedRobots;
pub use matcher::pattern_matches;
pub use parser::{ParsedRobots, RobotsDirective};

use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Why a robots.txt could not be obtained
///
/// Callers treat every variant the same way (allow everything) but the
/// variants keep the logs precise.
#[derive(Debug, Error)]
pub enum RobotsFetchError {
    #[error("URL has no origin: {0}")]
    NoOrigin(String),

    #[error("robots.txt returned HTTP {0}")]
    Status(u16),

    #[error("robots.txt request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Fetches and parses `{origin}/robots.txt` for the origin of `page_url`
///
/// Only a 2xx response is parsed. Redirects are followed by the client.
pub async fn fetch_robots(
    client: &reqwest::Client,
    page_url: &Url,
    user_agent: &str,
    timeout: Duration,
) -> Result<ParsedRobots, RobotsFetchError> {
    let robots_url = crate::url::robots_url(page_url)
        .ok_or_else(|| RobotsFetchError::NoOrigin(page_url.to_string()))?;

    tracing::debug!("Fetching {}", robots_url);

    let response = client
        .get(robots_url.as_str())
        .header(reqwest::header::USER_AGENT, user_agent)
        .timeout(timeout)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(RobotsFetchError::Status(status.as_u16()));
    }

    let body = response.text().await?;
    Ok(ParsedRobots::from_content(&body))
}

/// Path and query of a URL in the form robots.txt rules are matched against
pub fn robots_path(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

/// Checks if a URL is allowed by robots.txt
pub fn is_allowed(robots: &ParsedRobots, url: &Url, user_agent: &str) -> bool {
    robots.is_allowed(&robots_path(url), user_agent)
}
