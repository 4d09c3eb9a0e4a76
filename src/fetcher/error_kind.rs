use crate::renderer::RenderError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse class of a fetch failure, reported alongside retries
///
/// Retry decisions do not depend on the kind: they use the configured list of
/// retryable substrings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchErrorKind {
    Network,
    Timeout,
    Http,
    RobotsFetch,
    Extraction,
    Other,
}

impl FetchErrorKind {
    /// Classifies a failure message
    ///
    /// # Examples
    ///
    /// ```
    /// use portal_scout::fetcher::FetchErrorKind;
    ///
    /// assert_eq!(FetchErrorKind::classify("navigation timed out after 30000ms"), FetchErrorKind::Timeout);
    /// assert_eq!(FetchErrorKind::classify("HTTP 503"), FetchErrorKind::Http);
    /// assert_eq!(FetchErrorKind::classify("ECONNRESET"), FetchErrorKind::Network);
    /// ```
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();

        if lower.contains("timeout") || lower.contains("timed out") {
            Self::Timeout
        } else if lower.contains("robots") {
            Self::RobotsFetch
        } else if lower.starts_with("http ") || lower.contains("status") {
            Self::Http
        } else if ["network", "connection", "net::err", "econnreset", "econnrefused", "socket", "dns"]
            .iter()
            .any(|needle| lower.contains(needle))
        {
            Self::Network
        } else if lower.contains("extract") || lower.contains("evaluat") || lower.contains("no page loaded") {
            Self::Extraction
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Http => "http",
            Self::RobotsFetch => "robots-fetch",
            Self::Extraction => "extraction",
            Self::Other => "other",
        }
    }
}

impl From<&RenderError> for FetchErrorKind {
    fn from(error: &RenderError) -> Self {
        match error {
            RenderError::Network(_) => Self::Network,
            RenderError::Timeout(_) => Self::Timeout,
            RenderError::Http { .. } => Self::Http,
            RenderError::Extraction(_) => Self::Extraction,
            RenderError::NotInitialized => Self::Other,
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
