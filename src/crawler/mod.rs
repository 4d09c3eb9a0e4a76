//! Frontier BFS crawler
//!
//! Discovers the structure of a portal breadth-first from one seed URL and
//! records a `NavigationNode` per visited page. The crawler owns a
//! `PageRenderer` and shares a `PolitenessGovernor` with the fetch executor.
//!
//! # Components
//!
//! - `Frontier`: FIFO queue plus visited set
//! - `CrawlSession`: the traversal loop, one recorded node per step
//! - `parser`: title, links, page type and metadata extraction
//! - `CrawlStats`: session counters

mod frontier;
mod language;
mod parser;
mod session;
mod stats;

pub use frontier::{Frontier, FrontierEntry};
pub use language::detect_language;
pub use parser::{
    collapse_whitespace, determine_page_type, discover_links, extract_breadcrumb, extract_links,
    extract_last_modified, extract_metadata, extract_title, is_attachment_url, parse_page,
    visible_text, LinkScope, ParsedPage,
};
pub(crate) use parser::{
    element_text, raw_visible_text, resolve_link, selector, ATTACHMENT_CONTAINERS,
};
pub use session::{CrawlReport, CrawlSession, CRAWLER_ID};
pub use stats::CrawlStats;

pub use crate::config::CrawlOptions;

use crate::governor::PolitenessGovernor;
use crate::renderer::{PageRenderer, RendererOptions};
use crate::state::NavigationNode;
use crate::ScoutError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Breadth-first crawler over a page renderer
pub struct Crawler<R: PageRenderer> {
    renderer: R,
    governor: Arc<PolitenessGovernor>,
    renderer_options: RendererOptions,
}

impl<R: PageRenderer> Crawler<R> {
    pub fn new(
        renderer: R,
        governor: Arc<PolitenessGovernor>,
        renderer_options: RendererOptions,
    ) -> Self {
        Self {
            renderer,
            governor,
            renderer_options,
        }
    }

    pub fn governor(&self) -> &Arc<PolitenessGovernor> {
        &self.governor
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Opens a session that yields one node per `next_node()` call
    ///
    /// Options are validated before the renderer is initialized, so an invalid
    /// seed or pattern leaves the renderer untouched. The caller must end the
    /// session with `finish()` to release the renderer.
    pub async fn session(
        &mut self,
        options: CrawlOptions,
        cancel: CancellationToken,
    ) -> crate::Result<CrawlSession<'_, R>> {
        let mut session =
            CrawlSession::new(&mut self.renderer, self.governor.clone(), options, cancel)?;
        session.open(&self.renderer_options).await?;
        Ok(session)
    }

    /// Runs a whole session and returns the report
    ///
    /// The renderer is closed whether the session ends normally, is cancelled
    /// or aborts with an error.
    ///
    /// # Arguments
    ///
    /// * `options` - Seed URL, limits and filters for this session
    /// * `cancel` - Stops the session before the next URL is dequeued
    ///
    /// # Returns
    ///
    /// The report of the finished session. Errors raised before the renderer
    /// opens are returned as is; an error after that is wrapped in
    /// `ScoutError::CrawlAborted` together with the nodes recorded so far.
    pub async fn run(
        &mut self,
        options: CrawlOptions,
        cancel: CancellationToken,
    ) -> crate::Result<CrawlReport> {
        tracing::info!(
            "Starting crawl of {} (max depth {}, max pages {})",
            options.start_url,
            options.max_depth,
            options.max_pages
        );

        let mut session = self.session(options, cancel).await?;
        let outcome = session.run_to_end().await;
        let report = session.finish().await;

        match outcome {
            Ok(()) => Ok(report),
            Err(e) => {
                tracing::error!("Crawl aborted after {} nodes: {}", report.nodes.len(), e);
                Err(ScoutError::CrawlAborted {
                    source: Box::new(e),
                    partial: Box::new(report),
                })
            }
        }
    }

    /// Crawls from `options.start_url` and returns the recorded nodes in
    /// visit order
    ///
    /// Unlike `run`, an abort surfaces the underlying error and drops the
    /// partial nodes.
    pub async fn crawl(&mut self, options: CrawlOptions) -> crate::Result<Vec<NavigationNode>> {
        match self.run(options, CancellationToken::new()).await {
            Ok(report) => Ok(report.nodes),
            Err(ScoutError::CrawlAborted { source, .. }) => Err(*source),
            Err(e) => Err(e),
        }
    }
}
