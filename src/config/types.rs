use crate::renderer::WaitStrategy;
use serde::{Deserialize, Serialize};

/// Main configuration structure for Portal-Scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlOptions,
    #[serde(default)]
    pub scrape: ScrapeOptions,
    #[serde(default)]
    pub politeness: PolitenessConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Options for one breadth-first crawl session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlOptions {
    /// Seed URL, crawled at level 0
    pub start_url: String,

    /// Links are followed from pages whose level is below this value
    pub max_depth: u32,

    /// The session stops once this many pages were crawled successfully
    pub max_pages: usize,

    /// Whether links to other hosts are queued
    pub follow_external_links: bool,

    /// Whether asset links are queued and asset loads allowed in the renderer
    pub include_assets: bool,

    /// Whether robots.txt rules and crawl delays are honored
    pub respect_robots_txt: bool,

    /// Minimum spacing between two page requests of this session (milliseconds)
    pub crawl_delay_ms: u64,

    /// Navigation timeout per page (milliseconds)
    pub timeout_ms: u64,

    /// Regular expressions; a matching URL is skipped
    pub skip_patterns: Vec<String>,

    /// Regular expressions; when non-empty a URL must match one of them
    pub include_patterns: Vec<String>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            start_url: String::new(),
            max_depth: 3,
            max_pages: 100,
            follow_external_links: false,
            include_assets: false,
            respect_robots_txt: true,
            crawl_delay_ms: 1000,
            timeout_ms: 30_000,
            skip_patterns: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

/// Options for one fetch executor invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ScrapeOptions {
    pub include_images: bool,
    pub include_attachments: bool,
    /// Collapse whitespace in extracted text and classify Korean/English content
    pub process_korean_text: bool,
    pub use_cache: bool,
    pub cache_ttl_secs: u64,
    pub retry_on_failure: bool,
    pub max_retries: u32,
    pub timeout_ms: u64,
    pub wait_strategy: WaitStrategy,
    pub extract_tables: bool,
    pub follow_pagination: bool,
    /// Upper bound on pages merged into one document when following pagination
    pub max_pages: u32,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            include_images: true,
            include_attachments: true,
            process_korean_text: true,
            use_cache: true,
            cache_ttl_secs: 3600,
            retry_on_failure: true,
            max_retries: 3,
            timeout_ms: 30_000,
            wait_strategy: WaitStrategy::NetworkIdle,
            extract_tables: true,
            follow_pagination: false,
            max_pages: 5,
        }
    }
}

/// Rate limiting and robots.txt settings shared by every crawl and fetch
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PolitenessConfig {
    pub requests_per_second: f64,

    /// Requests allowed inside one burst window before a cooldown is imposed
    pub burst_size: u32,
    pub burst_window_ms: u64,
    pub cooldown_ms: u64,

    /// Crawl delay used when robots.txt does not specify one (seconds)
    pub default_crawl_delay_secs: f64,
    pub robots_ttl_secs: u64,
    pub robots_timeout_ms: u64,
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 1.0,
            burst_size: 10,
            burst_window_ms: 60_000,
            cooldown_ms: 10_000,
            default_crawl_delay_secs: 1.0,
            robots_ttl_secs: 24 * 60 * 60,
            robots_timeout_ms: 10_000,
        }
    }
}

/// Retry and backoff policy of the fetch executor
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RetryConfig {
    pub base_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub max_delay_ms: u64,

    /// Case-insensitive substrings; an error containing one of them is retried
    pub retryable_errors: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            backoff_multiplier: 2.0,
            max_delay_ms: 30_000,
            retryable_errors: [
                "timeout",
                "timed out",
                "network",
                "connection",
                "net::err",
                "econnreset",
                "econnrefused",
                "socket hang up",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}
