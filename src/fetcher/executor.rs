//! Fetch executor - retrieves one page with cache, retries and backoff
//!
//! # Flow
//!
//! 1. Normalize the URL; a malformed URL is a failed result
//! 2. With `use_cache`, a live `scrape:{url}` entry is returned immediately
//! 3. Otherwise attempt up to `max_retries + 1` times; each attempt waits for
//!    the governor, navigates and extracts
//! 4. A failure whose message contains a retryable substring sleeps
//!    `min(base * multiplier^(attempt - 1), max_delay)` and tries again;
//!    anything else returns at once
//!
//! Ordinary fetch failures never surface as `Err`: they come back as a
//! `ScrapeResult` with `success == false`.

use crate::cache::{get_json, put_json, CacheStore};
use crate::config::{RetryConfig, ScrapeOptions};
use crate::fetcher::extract::{extract_document, merge_page, ExtractedPage};
use crate::fetcher::FetchErrorKind;
use crate::governor::PolitenessGovernor;
use crate::renderer::{InterceptionPolicy, PageRenderer, RenderError, RendererOptions};
use crate::state::{ScrapeResult, ScrapedDocument};
use crate::url::normalize_url;
use crate::ScoutError;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

/// Governor identifier used by fetch executors
pub const FETCHER_ID: &str = "fetcher";

/// Upper bound on any single backoff sleep
pub const MAX_BACKOFF: Duration = Duration::from_millis(30_000);

/// Cache key of a normalized URL
pub fn cache_key(url: &Url) -> String {
    format!("scrape:{}", url)
}

/// Backoff before retry number `attempt` (1-based)
///
/// # Examples
///
/// ```
/// use portal_scout::config::RetryConfig;
/// use portal_scout::fetcher::backoff_delay;
/// use std::time::Duration;
///
/// let retry = RetryConfig::default();
/// assert_eq!(backoff_delay(&retry, 1), Duration::from_millis(1000));
/// assert_eq!(backoff_delay(&retry, 3), Duration::from_millis(4000));
/// assert_eq!(backoff_delay(&retry, 10), Duration::from_millis(30_000));
/// ```
pub fn backoff_delay(retry: &RetryConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
    let delay_ms = retry.base_delay_ms as f64 * retry.backoff_multiplier.powi(exponent);
    let cap = Duration::from_millis(retry.max_delay_ms).min(MAX_BACKOFF);

    if delay_ms.is_finite() && delay_ms < cap.as_millis() as f64 {
        Duration::from_millis(delay_ms.max(0.0) as u64)
    } else {
        cap
    }
}

/// Whether `message` contains one of the retryable substrings, ignoring case
pub fn is_retryable(message: &str, retry: &RetryConfig) -> bool {
    let lower = message.to_lowercase();
    retry
        .retryable_errors
        .iter()
        .any(|needle| lower.contains(&needle.to_lowercase()))
}

struct RendererSlot<R> {
    renderer: R,
    open: bool,
}

/// Retrieves single pages through a renderer, a cache and the governor
///
/// Calls are serialized on the renderer; the cache and governor may be shared
/// with other executors and crawl sessions.
pub struct FetchExecutor<R: PageRenderer, C: CacheStore + ?Sized> {
    slot: Mutex<RendererSlot<R>>,
    cache: Arc<C>,
    governor: Arc<PolitenessGovernor>,
    retry: RetryConfig,
    renderer_options: RendererOptions,
}

impl<R: PageRenderer, C: CacheStore + ?Sized> FetchExecutor<R, C> {
    pub fn new(
        renderer: R,
        cache: Arc<C>,
        governor: Arc<PolitenessGovernor>,
        retry: RetryConfig,
        renderer_options: RendererOptions,
    ) -> Self {
        Self {
            slot: Mutex::new(RendererSlot {
                renderer,
                open: false,
            }),
            cache,
            governor,
            retry,
            renderer_options,
        }
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Fetches and extracts `url`
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL of the document
    /// * `options` - Wait strategy, timeout, pagination and extraction flags
    ///
    /// # Returns
    ///
    /// A `ScrapeResult` carrying the document, or the last error with
    /// `success == false` once retries are spent. Returns `Err` only when the
    /// renderer reports it was used uninitialized.
    pub async fn scrape_page(&self, url: &str, options: &ScrapeOptions) -> crate::Result<ScrapeResult> {
        let started = Instant::now();
        let elapsed_ms = || started.elapsed().as_millis() as u64;

        let url = match normalize_url(url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot fetch {}: {}", url, e);
                return Ok(ScrapeResult::failed(url, e.to_string(), elapsed_ms(), 0));
            }
        };
        let key = cache_key(&url);

        if options.use_cache {
            match get_json::<C, ScrapedDocument>(&*self.cache, &key).await {
                Ok(Some(document)) => {
                    tracing::debug!("Cache hit for {}", url);
                    let mut result = ScrapeResult::succeeded(url.as_str(), document, elapsed_ms(), 0);
                    result.from_cache = true;
                    return Ok(result);
                }
                Ok(None) => tracing::trace!("Cache miss for {}", url),
                Err(e) => tracing::warn!("Cache read failed for {}: {}", url, e),
            }
        }

        let max_retries = if options.retry_on_failure {
            options.max_retries
        } else {
            0
        };

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let retries = attempt - 1;

            match self.attempt(&url, options).await {
                Ok(document) => {
                    if options.use_cache {
                        if let Err(e) =
                            put_json(&*self.cache, &key, &document, options.cache_ttl_secs).await
                        {
                            tracing::warn!("Cache write failed for {}: {}", url, e);
                        }
                    }
                    tracing::debug!(
                        "Fetched {} in {}ms after {} retries",
                        url,
                        elapsed_ms(),
                        retries
                    );
                    return Ok(ScrapeResult::succeeded(
                        url.as_str(),
                        document,
                        elapsed_ms(),
                        retries,
                    ));
                }
                Err(RenderError::NotInitialized) => return Err(ScoutError::RendererNotInitialized),
                Err(e) => {
                    let message = e.to_string();
                    let kind = FetchErrorKind::from(&e);

                    if retries >= max_retries || !is_retryable(&message, &self.retry) {
                        tracing::warn!(
                            "Fetching {} failed ({}) after {} attempts: {}",
                            url,
                            kind,
                            attempt,
                            message
                        );
                        return Ok(ScrapeResult::failed(url.as_str(), message, elapsed_ms(), retries));
                    }

                    let delay = backoff_delay(&self.retry, attempt);
                    tracing::warn!(
                        "Attempt {} for {} failed ({}): {}, retrying in {}ms",
                        attempt,
                        url,
                        kind,
                        message,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// One attempt: the page itself plus any pagination continuations
    async fn attempt(&self, url: &Url, options: &ScrapeOptions) -> Result<ScrapedDocument, RenderError> {
        let mut slot = self.slot.lock().await;
        self.ensure_open(&mut slot).await?;

        let first = self.render(&mut slot.renderer, url, options).await?;
        let mut document = first.document;
        let mut next = first.next_page;

        let mut seen = HashSet::from([url.to_string(), document.url.clone()]);
        let page_limit = options.max_pages.max(1);

        while let Some(next_url) = next.take() {
            if document.page_count >= page_limit || !seen.insert(next_url.to_string()) {
                break;
            }
            match self.render(&mut slot.renderer, &next_url, options).await {
                Ok(page) => {
                    tracing::debug!("Following pagination to {}", next_url);
                    seen.insert(page.document.url.clone());
                    next = page.next_page;
                    merge_page(&mut document, page.document);
                }
                Err(e) => {
                    tracing::warn!("Pagination stopped at {}: {}", next_url, e);
                    break;
                }
            }
        }

        Ok(document)
    }

    async fn render(
        &self,
        renderer: &mut R,
        url: &Url,
        options: &ScrapeOptions,
    ) -> Result<ExtractedPage, RenderError> {
        self.governor.wait_for_next_request(FETCHER_ID, None).await;

        let timeout = Duration::from_millis(options.timeout_ms);
        let response = renderer.goto(url, options.wait_strategy, timeout).await?;
        if !response.ok {
            if response.status == 429 {
                self.governor.set_cooldown(FETCHER_ID, None).await;
            }
            return Err(RenderError::Http {
                status: response.status,
            });
        }

        let html = renderer.content().await?;
        self.governor.record_request(FETCHER_ID).await;

        Ok(extract_document(&html, &response.final_url, options))
    }

    async fn ensure_open(&self, slot: &mut RendererSlot<R>) -> Result<(), RenderError> {
        if slot.open {
            return Ok(());
        }
        slot.renderer.initialize(&self.renderer_options).await?;
        slot.renderer
            .set_interception(InterceptionPolicy::default())
            .await?;
        slot.open = true;
        Ok(())
    }

    /// Releases the renderer; the next fetch opens it again
    pub async fn close(&self) -> crate::Result<()> {
        let mut slot = self.slot.lock().await;
        if slot.open {
            slot.open = false;
            slot.renderer.close().await?;
        }
        Ok(())
    }
}
