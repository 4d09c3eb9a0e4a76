//! Page renderer seam
//!
//! The crawler and the fetch executor never talk HTTP directly: they drive a
//! `PageRenderer` (navigate, snapshot the DOM, close) and run their extractors
//! over the snapshot with `scraper`.
//!
//! Two implementations ship with the crate:
//! - `HttpRenderer`: static HTML over `reqwest`
//! - `StaticRenderer`: in-memory pages, for offline replay and tests

mod http;
mod static_pages;

pub use http::HttpRenderer;
pub use static_pages::StaticRenderer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// When a navigation counts as finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitStrategy {
    /// The load event fired
    Load,
    /// The DOM was parsed
    DomContentLoaded,
    /// No network activity for a short period
    #[default]
    NetworkIdle,
}

/// Sub-resource classes a renderer can refuse to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Image,
    Media,
    Font,
    Stylesheet,
    Script,
}

/// Which sub-resources the renderer aborts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterceptionPolicy {
    pub blocked: Vec<ResourceKind>,
}

impl InterceptionPolicy {
    /// Policy used while discovering structure: images, media and fonts are
    /// aborted unless assets were requested
    pub fn discovery(include_assets: bool) -> Self {
        if include_assets {
            Self::default()
        } else {
            Self {
                blocked: vec![ResourceKind::Image, ResourceKind::Media, ResourceKind::Font],
            }
        }
    }

    pub fn allows(&self, kind: ResourceKind) -> bool {
        !self.blocked.contains(&kind)
    }
}

/// Settings applied by `PageRenderer::initialize`
#[derive(Debug, Clone, Default)]
pub struct RendererOptions {
    pub user_agent: String,
    /// Extra headers sent with every navigation
    pub headers: Vec<(String, String)>,
}

/// Outcome of a navigation that reached the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationResponse {
    /// True for 2xx responses
    pub ok: bool,
    pub status: u16,
    /// URL after redirects
    pub final_url: Url,
}

/// Failures at the renderer boundary
///
/// The messages are what the fetch executor matches its retryable
/// substrings against, so transport failures mention "network" or
/// "timed out".
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("renderer used before initialize()")]
    NotInitialized,

    #[error("network error: {0}")]
    Network(String),

    #[error("navigation timed out after {0}ms")]
    Timeout(u64),

    #[error("HTTP {status}")]
    Http { status: u16 },

    #[error("extraction failed: {0}")]
    Extraction(String),
}

/// A browser-like handle that loads pages and exposes their DOM
///
/// One handle serves one caller at a time; the crawler owns its handle for a
/// whole session.
#[async_trait]
pub trait PageRenderer: Send {
    /// Opens the handle; must be called before any navigation
    async fn initialize(&mut self, options: &RendererOptions) -> Result<(), RenderError>;

    /// Replaces the sub-resource interception policy
    async fn set_interception(&mut self, policy: InterceptionPolicy) -> Result<(), RenderError>;

    /// Navigates to `url`, waiting according to `wait` for at most `timeout`
    ///
    /// Non-2xx responses are returned with `ok == false`, not as errors.
    async fn goto(
        &mut self,
        url: &Url,
        wait: WaitStrategy,
        timeout: Duration,
    ) -> Result<NavigationResponse, RenderError>;

    /// Serialized DOM of the current page
    async fn content(&mut self) -> Result<String, RenderError>;

    /// Releases the handle; calling it twice is harmless
    async fn close(&mut self) -> Result<(), RenderError>;
}
