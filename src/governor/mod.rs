//! Politeness governor
//!
//! The governor is shared by every crawl session and fetch executor of the
//! process (`Arc<PolitenessGovernor>`). It enforces:
//! - a minimum spacing of `1000 / requests-per-second` ms per identifier
//! - a burst budget per window, followed by a cooldown when it is spent
//! - robots.txt rules and crawl delays, cached per origin
//!
//! Identifiers are logical callers ("crawler", "fetcher"), not hosts. Waiting
//! never holds a lock, so a sleeping caller does not block other identifiers.

mod timing;

pub use timing::RequestTiming;

use crate::config::PolitenessConfig;
use crate::fetcher::FetchErrorKind;
use crate::robots::{fetch_robots, is_allowed, CachedRobots, ParsedRobots};
use crate::url::origin_of;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

/// Timing entries idle for longer than this are dropped by `cleanup()`
const TIMING_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Upper bound on crawl delays and on the spacing derived from the request rate
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(60 * 60);

/// Converts a delay in seconds, clamping it to `0..=MAX_CRAWL_DELAY`
///
/// NaN and negative values become zero; values too large for a `Duration`
/// become the cap.
///
/// # Examples
///
/// ```
/// use portal_scout::governor::{delay_from_secs, MAX_CRAWL_DELAY};
/// use std::time::Duration;
///
/// assert_eq!(delay_from_secs(2.5), Duration::from_millis(2500));
/// assert_eq!(delay_from_secs(1e20), MAX_CRAWL_DELAY);
/// assert_eq!(delay_from_secs(f64::NAN), Duration::ZERO);
/// ```
pub fn delay_from_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs)
        .unwrap_or(MAX_CRAWL_DELAY)
        .min(MAX_CRAWL_DELAY)
}

type RobotsSlot = Arc<Mutex<Option<CachedRobots>>>;

/// Entries removed by one `cleanup()` pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupStats {
    pub timings_removed: usize,
    pub robots_removed: usize,
}

/// Rate limiter and robots.txt authority
pub struct PolitenessGovernor {
    config: PolitenessConfig,
    user_agent: String,
    client: reqwest::Client,
    timings: Mutex<HashMap<String, RequestTiming>>,
    robots: Mutex<HashMap<String, RobotsSlot>>,
}

impl PolitenessGovernor {
    /// Creates a governor with its own HTTP client for robots.txt requests
    pub fn new(config: PolitenessConfig, user_agent: impl Into<String>) -> crate::Result<Self> {
        let user_agent = user_agent.into();
        let client = reqwest::Client::builder()
            .user_agent(user_agent.clone())
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self::with_client(config, user_agent, client))
    }

    /// Creates a governor that fetches robots.txt through `client`
    pub fn with_client(
        config: PolitenessConfig,
        user_agent: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            config,
            user_agent: user_agent.into(),
            client,
            timings: Mutex::new(HashMap::new()),
            robots: Mutex::new(HashMap::new()),
        }
    }

    /// The User-Agent sent with robots.txt requests
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn config(&self) -> &PolitenessConfig {
        &self.config
    }

    /// Minimum spacing between two requests of one identifier
    pub fn min_interval(&self) -> Duration {
        delay_from_secs(1.0 / self.config.requests_per_second)
    }

    fn burst_window(&self) -> Duration {
        Duration::from_millis(self.config.burst_window_ms)
    }

    fn default_cooldown(&self) -> Duration {
        Duration::from_millis(self.config.cooldown_ms)
    }

    /// Checks whether `id` may issue a request right now
    ///
    /// Returns false during a cooldown, when the last request is more recent
    /// than the minimum interval, or when the burst budget is spent. The last
    /// case starts a cooldown.
    pub async fn check_limit(&self, id: &str) -> bool {
        let now = Instant::now();
        let mut timings = self.timings.lock().await;

        let Some(timing) = timings.get_mut(id) else {
            return true;
        };

        if timing.in_cooldown(now) {
            tracing::trace!("{} refused: cooling down", id);
            return false;
        }

        if let Some(elapsed) = timing.since_last_request(now) {
            if elapsed < self.min_interval() {
                tracing::trace!("{} refused: last request {:?} ago", id, elapsed);
                return false;
            }
        }

        if timing.budget_exhausted(now, self.burst_window(), self.config.burst_size) {
            let cooldown = self.default_cooldown();
            tracing::debug!(
                "{} spent its burst budget of {}, cooling down for {:?}",
                id,
                self.config.burst_size,
                cooldown
            );
            timing.start_cooldown(now, cooldown);
            return false;
        }

        true
    }

    /// Records a permitted request for `id`
    ///
    /// Consumes one unit of the burst budget and clears any active cooldown.
    pub async fn record_request(&self, id: &str) {
        let now = Instant::now();
        let window = self.burst_window();
        let mut timings = self.timings.lock().await;
        timings
            .entry(id.to_string())
            .or_insert_with(|| RequestTiming::new(now))
            .record(now, window);
    }

    /// Blocks `id` for `duration`, or the configured cooldown when None
    ///
    /// Callers use this to back off after an HTTP 429.
    pub async fn set_cooldown(&self, id: &str, duration: Option<Duration>) {
        let now = Instant::now();
        let cooldown = duration.unwrap_or_else(|| self.default_cooldown());
        let mut timings = self.timings.lock().await;
        timings
            .entry(id.to_string())
            .or_insert_with(|| RequestTiming::new(now))
            .start_cooldown(now, cooldown);
        tracing::debug!("{} cooling down for {:?}", id, cooldown);
    }

    /// Sleeps until `id` may issue its next request
    ///
    /// The required spacing is the larger of the minimum interval and the
    /// crawl delay for `url` (when given), less the time since the last
    /// request. An active cooldown is waited out as well. Returns how long the
    /// caller slept.
    pub async fn wait_for_next_request(&self, id: &str, url: Option<&Url>) -> Duration {
        self.wait_with_min_delay(id, url, Duration::ZERO).await
    }

    /// Like `wait_for_next_request` with an additional caller-side spacing floor
    pub async fn wait_with_min_delay(
        &self,
        id: &str,
        url: Option<&Url>,
        floor: Duration,
    ) -> Duration {
        let crawl_delay = match url {
            Some(url) => {
                let user_agent = self.user_agent.clone();
                delay_from_secs(self.get_crawl_delay(url, &user_agent).await)
            }
            None => Duration::ZERO,
        };

        let spacing = self.min_interval().max(crawl_delay).max(floor);

        let wait = {
            let timings = self.timings.lock().await;
            timings
                .get(id)
                .and_then(|t| t.time_until_next_request(Instant::now(), spacing))
        };

        match wait {
            Some(delay) => {
                tracing::trace!("{} waiting {:?} before next request", id, delay);
                tokio::time::sleep(delay).await;
                delay
            }
            None => Duration::ZERO,
        }
    }

    /// Checks robots.txt for `url`
    ///
    /// Fetch failures and non-2xx responses allow everything.
    pub async fn is_url_allowed(&self, url: &Url, user_agent: &str) -> bool {
        self.with_robots(url, |robots| is_allowed(robots, url, user_agent))
            .await
    }

    /// Crawl delay for `url` in seconds, falling back to the configured default
    ///
    /// # Arguments
    ///
    /// * `url` - Any URL of the origin whose robots.txt applies
    /// * `user_agent` - The agent the robots.txt group is selected for
    ///
    /// # Returns
    ///
    /// The delay in seconds, never above `MAX_CRAWL_DELAY`
    pub async fn get_crawl_delay(&self, url: &Url, user_agent: &str) -> f64 {
        let delay = self
            .with_robots(url, |robots| robots.crawl_delay(user_agent))
            .await
            .unwrap_or(self.config.default_crawl_delay_secs);
        delay_from_secs(delay).as_secs_f64()
    }

    /// Runs `f` against the cached robots.txt of the URL's origin
    ///
    /// A missing or stale entry is fetched first. The per-origin slot stays
    /// locked during the fetch so concurrent lookups for one origin share it.
    async fn with_robots<T>(&self, url: &Url, f: impl FnOnce(&ParsedRobots) -> T) -> T {
        let Some(origin) = origin_of(url) else {
            return f(&ParsedRobots::allow_all());
        };

        let slot = {
            let mut robots = self.robots.lock().await;
            robots.entry(origin.clone()).or_default().clone()
        };

        let mut entry = slot.lock().await;
        let ttl = Duration::from_secs(self.config.robots_ttl_secs);
        let fresh = matches!(entry.as_ref(), Some(cached) if !cached.is_stale(ttl));

        if fresh {
            tracing::trace!("Using cached robots.txt for {}", origin);
        } else {
            let timeout = Duration::from_millis(self.config.robots_timeout_ms);
            let parsed = match fetch_robots(&self.client, url, &self.user_agent, timeout).await {
                Ok(parsed) => {
                    tracing::debug!(
                        "Fetched robots.txt for {} ({} groups)",
                        origin,
                        parsed.groups().len()
                    );
                    parsed
                }
                Err(e) => {
                    let message = e.to_string();
                    tracing::warn!(
                        "robots.txt unavailable for {} ({}), allowing all: {}",
                        origin,
                        FetchErrorKind::classify(&message),
                        message
                    );
                    ParsedRobots::allow_all()
                }
            };
            *entry = Some(CachedRobots::new(parsed));
        }

        match entry.as_ref() {
            Some(cached) => f(&cached.content),
            None => f(&ParsedRobots::allow_all()),
        }
    }

    /// Snapshot of the timing entry for `id`
    pub async fn timing(&self, id: &str) -> Option<RequestTiming> {
        self.timings.lock().await.get(id).cloned()
    }

    /// Number of origins with a robots.txt cache slot
    pub async fn robots_cache_len(&self) -> usize {
        self.robots.lock().await.len()
    }

    /// Evicts stale robots.txt entries and timing entries idle for over a day
    ///
    /// Slots that are being fetched right now are kept.
    pub async fn cleanup(&self) -> CleanupStats {
        let now = Instant::now();
        let ttl = Duration::from_secs(self.config.robots_ttl_secs);

        let timings_removed = {
            let mut timings = self.timings.lock().await;
            let before = timings.len();
            timings.retain(|_, t| now.saturating_duration_since(t.last_activity()) < TIMING_RETENTION);
            before - timings.len()
        };

        let robots_removed = {
            let mut robots = self.robots.lock().await;
            let before = robots.len();
            robots.retain(|_, slot| match slot.try_lock() {
                Ok(entry) => matches!(entry.as_ref(), Some(cached) if !cached.is_stale(ttl)),
                Err(_) => true,
            });
            before - robots.len()
        };

        if timings_removed > 0 || robots_removed > 0 {
            tracing::debug!(
                "Governor cleanup removed {} timing and {} robots entries",
                timings_removed,
                robots_removed
            );
        }

        CleanupStats {
            timings_removed,
            robots_removed,
        }
    }
}
