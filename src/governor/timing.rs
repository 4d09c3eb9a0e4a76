use std::time::Duration;
use tokio::time::Instant;

/// Request timing for one logical identifier (e.g. "crawler", "fetcher")
///
/// Tracks the spacing between requests, the burst budget of the current
/// window and an optional cooldown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTiming {
    /// When the last permitted request was recorded
    pub last_request: Option<Instant>,

    /// Requests recorded in the current burst window
    pub request_count: u32,

    /// Start of the current burst window
    pub window_start: Instant,

    /// Requests are refused until this instant
    pub cooldown_until: Option<Instant>,
}

impl RequestTiming {
    /// Creates an empty timing entry whose window starts at `now`
    pub fn new(now: Instant) -> Self {
        Self {
            last_request: None,
            request_count: 0,
            window_start: now,
            cooldown_until: None,
        }
    }

    /// Whether a cooldown is still active at `now`
    pub fn in_cooldown(&self, now: Instant) -> bool {
        matches!(self.cooldown_until, Some(until) if now < until)
    }

    /// Time left in the active cooldown, zero when there is none
    pub fn cooldown_remaining(&self, now: Instant) -> Duration {
        self.cooldown_until
            .map(|until| until.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }

    /// Time elapsed since the last recorded request
    pub fn since_last_request(&self, now: Instant) -> Option<Duration> {
        self.last_request
            .map(|last| now.saturating_duration_since(last))
    }

    /// Whether the burst window that started at `window_start` is over
    pub fn window_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) >= window
    }

    /// Whether the burst budget of the current window is spent
    pub fn budget_exhausted(&self, now: Instant, window: Duration, burst_size: u32) -> bool {
        !self.window_expired(now, window) && self.request_count >= burst_size
    }

    /// Blocks the identifier for `cooldown`
    ///
    /// The burst budget is reset and the next window starts when the cooldown
    /// ends, so an expired cooldown does not immediately trigger another one.
    pub fn start_cooldown(&mut self, now: Instant, cooldown: Duration) {
        let until = now + cooldown;
        self.cooldown_until = Some(until);
        self.request_count = 0;
        self.window_start = until;
    }

    /// Consumes one unit of the burst budget
    pub fn record(&mut self, now: Instant, window: Duration) {
        if self.window_expired(now, window) {
            self.window_start = now;
            self.request_count = 0;
        }
        self.request_count += 1;
        self.last_request = Some(now);
        self.cooldown_until = None;
    }

    /// Time to wait before the next request given a minimum spacing
    ///
    /// Returns None if a request can be made now.
    pub fn time_until_next_request(&self, now: Instant, min_spacing: Duration) -> Option<Duration> {
        let spacing = match self.since_last_request(now) {
            Some(elapsed) => min_spacing.saturating_sub(elapsed),
            None => Duration::ZERO,
        };
        let wait = spacing.max(self.cooldown_remaining(now));

        if wait.is_zero() {
            None
        } else {
            Some(wait)
        }
    }

    /// Most recent moment this entry was touched
    pub fn last_activity(&self) -> Instant {
        let mut latest = self.window_start;
        if let Some(last) = self.last_request {
            latest = latest.max(last);
        }
        latest
    }
}
