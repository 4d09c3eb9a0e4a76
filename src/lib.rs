//! Portal-Scout: a polite government portal crawler
//!
//! This crate discovers the structure of a web portal breadth-first and retrieves
//! individual documents, while respecting robots.txt, crawl delays and request
//! budgets, and recovering from transient failures without losing work.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod fetcher;
pub mod governor;
pub mod output;
pub mod renderer;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Portal-Scout operations
///
/// Page-level fetch failures are not errors at this level: the crawler records
/// them as failed nodes and the fetch executor returns them inside a
/// `ScrapeResult`. What reaches this type aborts the whole call.
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Renderer error: {0}")]
    Renderer(renderer::RenderError),

    #[error("Page renderer used before initialize()")]
    RendererNotInitialized,

    /// A crawl session stopped on an error after recording some nodes
    #[error("Crawl aborted after {} nodes: {source}", .partial.nodes.len())]
    CrawlAborted {
        source: Box<ScoutError>,
        partial: Box<crawler::CrawlReport>,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session not found: {0}")]
    SessionNotFound(i64),
}

impl From<renderer::RenderError> for ScoutError {
    fn from(error: renderer::RenderError) -> Self {
        match error {
            renderer::RenderError::NotInitialized => ScoutError::RendererNotInitialized,
            other => ScoutError::Renderer(other),
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Portal-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlOptions, CrawlSession, CrawlStats, Crawler};
pub use fetcher::{FetchExecutor, ScrapeOptions};
pub use governor::PolitenessGovernor;
pub use state::{CrawlStatus, NavigationNode, PageType, ScrapeResult};
pub use url::{is_same_site, normalize_url};
