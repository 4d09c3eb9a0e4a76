//! Crawl session - the breadth-first traversal state machine
//!
//! A session owns the frontier, the visited set and the recorded nodes of one
//! crawl. Each `next_node()` call runs the loop until exactly one node is
//! recorded or the session ends:
//!
//! 1. Stop if cancelled, if `max_pages` successes were reached, or if the
//!    frontier is empty
//! 2. Pop the oldest entry and mark it visited
//! 3. Skip it (no node) if it matches a skip pattern, misses the include
//!    patterns, leaves the site, or is disallowed by robots.txt
//! 4. Wait for the governor, navigate, and record a success or failed node
//! 5. Below `max_depth`, queue the unseen in-scope links one level deeper

use crate::config::{compile_patterns, CrawlOptions};
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::crawler::parser::{discover_links, parse_page, LinkScope};
use crate::crawler::CrawlStats;
use crate::governor::PolitenessGovernor;
use crate::renderer::{InterceptionPolicy, PageRenderer, RenderError, RendererOptions, WaitStrategy};
use crate::state::{CrawlStatus, NavigationNode};
use crate::url::{is_same_site, normalize_url};
use chrono::Utc;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Governor identifier used by crawl sessions
pub const CRAWLER_ID: &str = "crawler";

/// Structure discovery only needs the parsed DOM
const DISCOVERY_WAIT: WaitStrategy = WaitStrategy::DomContentLoaded;

/// Log progress every this many recorded nodes
const PROGRESS_EVERY: usize = 10;

/// Everything a finished session produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Recorded nodes in visit order, children filled in
    pub nodes: Vec<NavigationNode>,
    pub stats: CrawlStats,

    /// URLs still queued when the session ended
    pub frontier_remaining: usize,
}

/// One breadth-first crawl over a borrowed renderer
pub struct CrawlSession<'a, R: PageRenderer> {
    renderer: &'a mut R,
    governor: Arc<PolitenessGovernor>,
    options: CrawlOptions,
    seed: Url,
    skip_patterns: Vec<Regex>,
    include_patterns: Vec<Regex>,
    frontier: Frontier,
    nodes: Vec<NavigationNode>,
    positions: HashMap<String, usize>,
    stats: CrawlStats,
    cancel: CancellationToken,
    finished: bool,
}

impl<'a, R: PageRenderer> CrawlSession<'a, R> {
    /// Validates the options and seeds the frontier
    ///
    /// The renderer is not touched until `open()`.
    pub(crate) fn new(
        renderer: &'a mut R,
        governor: Arc<PolitenessGovernor>,
        options: CrawlOptions,
        cancel: CancellationToken,
    ) -> crate::Result<Self> {
        let skip_patterns = compile_patterns(&options.skip_patterns)?;
        let include_patterns = compile_patterns(&options.include_patterns)?;
        let seed = normalize_url(&options.start_url)?;

        let mut frontier = Frontier::new();
        frontier.push(FrontierEntry::seed(seed.clone()));

        let mut stats = CrawlStats::new();
        stats.pages_discovered = 1;

        Ok(Self {
            renderer,
            governor,
            options,
            seed,
            skip_patterns,
            include_patterns,
            frontier,
            nodes: Vec::new(),
            positions: HashMap::new(),
            stats,
            cancel,
            finished: false,
        })
    }

    /// Initializes the renderer with the discovery interception policy
    ///
    /// On failure the renderer is closed again before the error is returned.
    pub(crate) async fn open(&mut self, renderer_options: &RendererOptions) -> crate::Result<()> {
        let policy = InterceptionPolicy::discovery(self.options.include_assets);

        let result = match self.renderer.initialize(renderer_options).await {
            Ok(()) => self.renderer.set_interception(policy).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            if let Err(close_err) = self.renderer.close().await {
                tracing::warn!("Failed to close renderer: {}", close_err);
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Runs the loop until one node is recorded
    ///
    /// Returns None once the session is over. The returned node is a snapshot:
    /// its `children` are only complete in the output of `finish()`.
    pub async fn next_node(&mut self) -> crate::Result<Option<NavigationNode>> {
        while !self.finished {
            if self.cancel.is_cancelled() {
                tracing::info!(
                    "Crawl cancelled, {} URLs left in frontier",
                    self.frontier.len()
                );
                self.finished = true;
                break;
            }

            if self.stats.pages_crawled >= self.options.max_pages {
                tracing::info!(
                    "Reached max_pages ({}), {} URLs left in frontier",
                    self.options.max_pages,
                    self.frontier.len()
                );
                self.finished = true;
                break;
            }

            let Some(entry) = self.frontier.pop() else {
                tracing::info!("Frontier is empty, crawl complete");
                self.finished = true;
                break;
            };

            if !self.frontier.mark_visited(&entry.url) {
                continue;
            }

            if let Some(reason) = self.skip_reason(&entry.url).await {
                tracing::debug!("Skipping {}: {}", entry.url, reason);
                self.stats.pages_skipped += 1;
                continue;
            }

            let node = self.visit(entry).await?;
            return Ok(Some(node));
        }

        Ok(None)
    }

    /// Drives the session until it ends
    pub async fn run_to_end(&mut self) -> crate::Result<()> {
        while self.next_node().await?.is_some() {}
        Ok(())
    }

    /// Closes the renderer and returns the recorded nodes
    pub async fn finish(mut self) -> CrawlReport {
        if let Err(e) = self.renderer.close().await {
            tracing::warn!("Failed to close renderer: {}", e);
        }
        self.stats.finished_at = Some(Utc::now());

        tracing::info!(
            "Crawl finished: {} URLs visited, {} crawled, {} failed, {} skipped of {} discovered in {}s",
            self.frontier.visited_count(),
            self.stats.pages_crawled,
            self.stats.pages_failed,
            self.stats.pages_skipped,
            self.stats.pages_discovered,
            self.stats.duration().num_seconds()
        );

        CrawlReport {
            nodes: self.nodes,
            stats: self.stats,
            frontier_remaining: self.frontier.len(),
        }
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    /// Nodes recorded so far
    pub fn nodes(&self) -> &[NavigationNode] {
        &self.nodes
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    async fn skip_reason(&self, url: &Url) -> Option<&'static str> {
        let url_str = url.as_str();

        if self.skip_patterns.iter().any(|re| re.is_match(url_str)) {
            return Some("matches a skip pattern");
        }

        if !self.include_patterns.is_empty()
            && !self.include_patterns.iter().any(|re| re.is_match(url_str))
        {
            return Some("matches no include pattern");
        }

        if !self.options.follow_external_links && !is_same_site(&self.seed, url) {
            return Some("external link");
        }

        if self.options.respect_robots_txt
            && !self
                .governor
                .is_url_allowed(url, self.governor.user_agent())
                .await
        {
            return Some("disallowed by robots.txt");
        }

        None
    }

    async fn visit(&mut self, entry: FrontierEntry) -> crate::Result<NavigationNode> {
        let FrontierEntry {
            url,
            parent_id,
            level,
            discovered_at,
        } = entry;

        let robots_url = self.options.respect_robots_txt.then_some(&url);
        self.governor
            .wait_with_min_delay(
                CRAWLER_ID,
                robots_url,
                Duration::from_millis(self.options.crawl_delay_ms),
            )
            .await;

        tracing::debug!("Crawling {} (level {})", url, level);
        let mut node = NavigationNode::pending(&url, level, parent_id, discovered_at);

        match self.render(&url).await {
            Ok((final_url, html)) => {
                let page = parse_page(&html, &final_url);
                self.governor.record_request(CRAWLER_ID).await;

                node.title = page.title.unwrap_or_default();
                node.page_type = page.page_type;
                node.metadata = page.metadata;
                node.last_crawled = Some(Utc::now());
                node.crawl_status = CrawlStatus::Success;

                if level < self.options.max_depth {
                    self.enqueue_links(&node.id, level + 1, &page.links);
                }
            }
            Err(RenderError::NotInitialized) => return Err(crate::ScoutError::RendererNotInitialized),
            Err(e) => {
                tracing::warn!("Failed to crawl {}: {}", url, e);
                if matches!(e, RenderError::Http { status: 429 }) {
                    self.governor.set_cooldown(CRAWLER_ID, None).await;
                }
                node = node.fail(e.to_string());
            }
        }

        Ok(self.record(node))
    }

    /// Navigates and snapshots the page; non-2xx responses become `Http` errors
    async fn render(&mut self, url: &Url) -> Result<(Url, String), RenderError> {
        let timeout = Duration::from_millis(self.options.timeout_ms);
        let response = self.renderer.goto(url, DISCOVERY_WAIT, timeout).await?;
        if !response.ok {
            return Err(RenderError::Http {
                status: response.status,
            });
        }
        let html = self.renderer.content().await?;
        Ok((response.final_url, html))
    }

    fn enqueue_links(&mut self, parent_id: &str, level: u32, links: &[Url]) {
        let scope = LinkScope {
            site: &self.seed,
            follow_external: self.options.follow_external_links,
            include_assets: self.options.include_assets,
        };
        let discovered = discover_links(links, &scope);
        let now = Utc::now();

        let mut added = 0;
        for url in discovered {
            let entry = FrontierEntry {
                url,
                parent_id: Some(parent_id.to_string()),
                level,
                discovered_at: now,
            };
            if self.frontier.push(entry) {
                added += 1;
            }
        }

        tracing::trace!("Queued {} new links at level {}", added, level);
        self.stats.pages_discovered += added;
    }

    fn record(&mut self, node: NavigationNode) -> NavigationNode {
        if node.crawl_status.is_success() {
            self.stats.pages_crawled += 1;
        } else {
            self.stats.pages_failed += 1;
        }
        self.stats.max_level_reached = self.stats.max_level_reached.max(node.level);

        if let Some(parent_id) = &node.parent_id {
            if let Some(&position) = self.positions.get(parent_id) {
                self.nodes[position].children.push(node.id.clone());
            }
        }

        self.positions.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node.clone());

        if self.nodes.len() % PROGRESS_EVERY == 0 {
            tracing::info!(
                "Progress: {} pages recorded, {} in frontier",
                self.nodes.len(),
                self.frontier.len()
            );
        }

        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolitenessConfig;
    use crate::crawler::Crawler;
    use crate::renderer::{ResourceKind, StaticRenderer};
    use crate::state::PageType;
    use std::collections::HashSet;
    use tokio::time::Instant;

    fn governor() -> Arc<PolitenessGovernor> {
        let config = PolitenessConfig {
            requests_per_second: 10.0,
            burst_size: 1000,
            default_crawl_delay_secs: 0.0,
            ..PolitenessConfig::default()
        };
        Arc::new(PolitenessGovernor::with_client(
            config,
            "TestBot/1.0",
            reqwest::Client::new(),
        ))
    }

    fn options(start_url: &str) -> CrawlOptions {
        CrawlOptions {
            start_url: start_url.to_string(),
            max_depth: 3,
            max_pages: 100,
            respect_robots_txt: false,
            crawl_delay_ms: 0,
            ..CrawlOptions::default()
        }
    }

    fn links(hrefs: &[&str]) -> String {
        let anchors: String = hrefs
            .iter()
            .map(|h| format!(r#"<a href="{}">{}</a>"#, h, h))
            .collect();
        format!("<html><body>{}</body></html>", anchors)
    }

    fn crawler(renderer: StaticRenderer) -> Crawler<StaticRenderer> {
        Crawler::new(renderer, governor(), RendererOptions::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_depth_one_excludes_external_links() {
        let site = StaticRenderer::new()
            .with_page("https://a.go.kr/", links(&["/b", "/c", "https://d.com/"]))
            .with_page("https://a.go.kr/b", links(&["/deeper"]))
            .with_page("https://a.go.kr/c", links(&[]));

        let mut crawler = crawler(site.clone());
        let nodes = crawler
            .crawl(CrawlOptions {
                max_depth: 1,
                ..options("https://a.go.kr/")
            })
            .await
            .unwrap();

        let summary: Vec<(String, u32)> = nodes.iter().map(|n| (n.url.clone(), n.level)).collect();
        assert_eq!(
            summary,
            vec![
                ("https://a.go.kr/".to_string(), 0),
                ("https://a.go.kr/b".to_string(), 1),
                ("https://a.go.kr/c".to_string(), 1),
            ]
        );
        assert_eq!(site.navigation_count("https://d.com/"), 0);
        assert_eq!(site.navigation_count("https://a.go.kr/deeper"), 0);
        assert_eq!(nodes[0].page_type, PageType::Homepage);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_pages_one_records_only_seed() {
        let site = StaticRenderer::new()
            .with_page("https://a.go.kr/", links(&["/b", "/c"]))
            .with_page("https://a.go.kr/b", links(&[]));

        let mut crawler = crawler(site);
        let report = crawler
            .run(
                CrawlOptions {
                    max_pages: 1,
                    ..options("https://a.go.kr/")
                },
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(report.nodes.len(), 1);
        assert_eq!(report.nodes[0].level, 0);
        assert_eq!(report.frontier_remaining, 2);
        assert_eq!(report.stats.pages_crawled, 1);
        assert_eq!(report.stats.pages_discovered, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bfs_order_levels_and_uniqueness() {
        let site = StaticRenderer::new()
            .with_page("https://a.go.kr/", links(&["/x", "/y", "/x#frag", "/?utm_source=loop"]))
            .with_page("https://a.go.kr/x", links(&["/", "/x/1", "/y"]))
            .with_page("https://a.go.kr/y", links(&["/y/1", "/x/1"]))
            .with_page("https://a.go.kr/x/1", links(&["/x/1/deep"]))
            .with_page("https://a.go.kr/y/1", links(&["/"]))
            .with_page("https://a.go.kr/x/1/deep", links(&[]));

        let mut crawler = crawler(site);
        let nodes = crawler.crawl(options("https://a.go.kr/")).await.unwrap();

        assert_eq!(nodes.len(), 6);

        let urls: HashSet<&str> = nodes.iter().map(|n| n.url.as_str()).collect();
        assert_eq!(urls.len(), nodes.len());

        assert!(nodes.windows(2).all(|w| w[0].level <= w[1].level));

        let by_id: HashMap<&str, &NavigationNode> =
            nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        for node in &nodes {
            match &node.parent_id {
                Some(parent) => assert_eq!(node.level, by_id[parent.as_str()].level + 1),
                None => assert_eq!(node.level, 0),
            }
        }

        // First discoverer wins: /x/1 is credited to /x, not /y
        let x1 = nodes.iter().find(|n| n.url == "https://a.go.kr/x/1").unwrap();
        let x = nodes.iter().find(|n| n.url == "https://a.go.kr/x").unwrap();
        assert_eq!(x1.parent_id.as_deref(), Some(x.id.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_children_are_filled_in() {
        let site = StaticRenderer::new()
            .with_page("https://a.go.kr/", links(&["/b", "/c"]))
            .with_page("https://a.go.kr/b", links(&[]))
            .with_page("https://a.go.kr/c", links(&[]));

        let mut crawler = crawler(site);
        let nodes = crawler.crawl(options("https://a.go.kr/")).await.unwrap();

        assert_eq!(nodes[0].children, vec![nodes[1].id.clone(), nodes[2].id.clone()]);
        assert!(nodes[1].children.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_page_is_recorded_once() {
        let site = StaticRenderer::new()
            .with_page("https://a.go.kr/", links(&["/missing", "/ok"]))
            .with_page("https://a.go.kr/ok", links(&["/missing"]))
            .with_status("https://a.go.kr/missing", 404, "");

        let mut crawler = crawler(site.clone());
        let report = crawler
            .run(options("https://a.go.kr/"), CancellationToken::new())
            .await
            .unwrap();

        let failed: Vec<&NavigationNode> = report
            .nodes
            .iter()
            .filter(|n| n.crawl_status == CrawlStatus::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].error.as_deref(), Some("HTTP 404"));
        assert!(failed[0].last_crawled.is_some());
        assert_eq!(site.navigation_count("https://a.go.kr/missing"), 1);
        assert_eq!(report.stats.pages_failed, 1);
        assert_eq!(report.stats.pages_crawled, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_error_becomes_failed_node() {
        let site = StaticRenderer::new()
            .with_page("https://a.go.kr/", links(&["/slow"]))
            .with_page("https://a.go.kr/slow", "never served")
            .fail_times("https://a.go.kr/slow", 5, RenderError::Timeout(30_000));

        let mut crawler = crawler(site.clone());
        let nodes = crawler.crawl(options("https://a.go.kr/")).await.unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].crawl_status, CrawlStatus::Failed);
        assert!(nodes[1].error.as_deref().unwrap().contains("timed out"));
        assert_eq!(site.navigation_count("https://a.go.kr/slow"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_and_include_patterns() {
        let site = StaticRenderer::new()
            .with_page(
                "https://a.go.kr/",
                links(&["/board/list", "/board/print", "/about"]),
            )
            .with_page("https://a.go.kr/board/list", links(&[]))
            .with_page("https://a.go.kr/board/print", links(&[]))
            .with_page("https://a.go.kr/about", links(&[]));

        let mut crawler = crawler(site.clone());
        let report = crawler
            .run(
                CrawlOptions {
                    skip_patterns: vec!["/print".to_string()],
                    include_patterns: vec![r"^https://a\.go\.kr/$".to_string(), "/board/".to_string()],
                    ..options("https://a.go.kr/")
                },
                CancellationToken::new(),
            )
            .await
            .unwrap();

        let urls: Vec<&str> = report.nodes.iter().map(|n| n.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.go.kr/", "https://a.go.kr/board/list"]);
        assert_eq!(report.stats.pages_skipped, 2);
        assert_eq!(site.navigation_count("https://a.go.kr/board/print"), 0);
        assert_eq!(site.navigation_count("https://a.go.kr/about"), 0);
        assert!(
            report.stats.pages_crawled + report.stats.pages_failed + report.stats.pages_skipped
                <= report.stats.pages_discovered
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_follow_external_links() {
        let site = StaticRenderer::new()
            .with_page("https://a.go.kr/", links(&["https://b.go.kr/"]))
            .with_page("https://b.go.kr/", links(&[]));

        let mut crawler = crawler(site);
        let nodes = crawler
            .crawl(CrawlOptions {
                follow_external_links: true,
                ..options("https://a.go.kr/")
            })
            .await
            .unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].url, "https://b.go.kr/");
    }

    #[tokio::test(start_paused = true)]
    async fn test_assets_are_not_crawled_by_default() {
        let site = StaticRenderer::new()
            .with_page("https://a.go.kr/", links(&["/files/plan.hwp", "/img/map.png"]));

        let mut crawler = crawler(site.clone());
        let nodes = crawler.crawl(options("https://a.go.kr/")).await.unwrap();

        assert_eq!(nodes.len(), 1);
        let policy = site.interception().unwrap();
        assert!(!policy.allows(ResourceKind::Image));
        assert!(!policy.allows(ResourceKind::Font));
    }

    #[tokio::test(start_paused = true)]
    async fn test_crawl_delay_spaces_requests() {
        let site = StaticRenderer::new()
            .with_page("https://a.go.kr/", links(&["/b", "/c"]))
            .with_page("https://a.go.kr/b", links(&[]))
            .with_page("https://a.go.kr/c", links(&[]));

        let mut crawler = crawler(site);
        let start = Instant::now();
        let nodes = crawler
            .crawl(CrawlOptions {
                crawl_delay_ms: 2000,
                ..options("https://a.go.kr/")
            })
            .await
            .unwrap();

        assert_eq!(nodes.len(), 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(4000), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(5000), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_emits_one_node_per_step() {
        let site = StaticRenderer::new()
            .with_page("https://a.go.kr/", links(&["/b"]))
            .with_page("https://a.go.kr/b", links(&[]));

        let mut crawler = crawler(site.clone());
        let mut session = crawler
            .session(options("https://a.go.kr/"), CancellationToken::new())
            .await
            .unwrap();

        let first = session.next_node().await.unwrap().unwrap();
        assert_eq!(first.level, 0);
        assert_eq!(session.frontier_len(), 1);

        let second = session.next_node().await.unwrap().unwrap();
        assert_eq!(second.parent_id.as_deref(), Some(first.id.as_str()));

        assert!(session.next_node().await.unwrap().is_none());
        assert!(session.is_finished());

        let report = session.finish().await;
        assert_eq!(report.nodes[0].children, vec![second.id]);
        assert_eq!(site.close_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_before_next_dequeue() {
        let site = StaticRenderer::new()
            .with_page("https://a.go.kr/", links(&["/b", "/c"]))
            .with_page("https://a.go.kr/b", links(&[]))
            .with_page("https://a.go.kr/c", links(&[]));

        let cancel = CancellationToken::new();
        let mut crawler = crawler(site.clone());
        let mut session = crawler
            .session(options("https://a.go.kr/"), cancel.clone())
            .await
            .unwrap();

        assert!(session.next_node().await.unwrap().is_some());
        cancel.cancel();
        assert!(session.next_node().await.unwrap().is_none());

        let report = session.finish().await;
        assert_eq!(report.nodes.len(), 1);
        assert_eq!(report.frontier_remaining, 2);
        assert_eq!(site.navigations().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_uninitialized_renderer_aborts_and_closes() {
        let site = StaticRenderer::new()
            .with_page("https://a.go.kr/", links(&["/b"]))
            .with_page("https://a.go.kr/b", links(&[]));

        let mut crawler = crawler(site.clone());
        let mut session = crawler
            .session(options("https://a.go.kr/"), CancellationToken::new())
            .await
            .unwrap();
        assert!(session.next_node().await.unwrap().is_some());

        // Tear the handle down behind the session's back
        let mut handle = site.clone();
        handle.close().await.unwrap();

        let err = session.next_node().await.unwrap_err();
        assert!(matches!(err, crate::ScoutError::RendererNotInitialized));

        session.finish().await;
        assert_eq!(site.close_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_run_keeps_partial_report() {
        let site = StaticRenderer::new()
            .with_page("https://a.go.kr/", links(&["/b", "/c"]))
            .with_page("https://a.go.kr/b", links(&[]))
            .with_page("https://a.go.kr/c", links(&[]))
            .fail_times("https://a.go.kr/b", 1, RenderError::NotInitialized);

        let mut crawler = crawler(site.clone());
        let err = crawler
            .run(options("https://a.go.kr/"), CancellationToken::new())
            .await
            .unwrap_err();

        let (source, partial) = match err {
            crate::ScoutError::CrawlAborted { source, partial } => (source, partial),
            other => panic!("expected CrawlAborted, got {:?}", other),
        };
        assert!(matches!(*source, crate::ScoutError::RendererNotInitialized));
        let urls: Vec<&str> = partial.nodes.iter().map(|n| n.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.go.kr/"]);
        assert_eq!(partial.stats.pages_crawled, 1);
        assert!(partial.stats.finished_at.is_some());
        assert_eq!(partial.frontier_remaining, 1);
        assert_eq!(site.close_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_crawl_surfaces_the_abort_cause() {
        let site = StaticRenderer::new()
            .with_page("https://a.go.kr/", links(&["/b"]))
            .fail_times("https://a.go.kr/b", 1, RenderError::NotInitialized);

        let mut crawler = crawler(site);
        let err = crawler.crawl(options("https://a.go.kr/")).await.unwrap_err();
        assert!(matches!(err, crate::ScoutError::RendererNotInitialized));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_options_fail_before_renderer_opens() {
        let site = StaticRenderer::new();
        let mut crawler = crawler(site.clone());

        let err = crawler
            .crawl(CrawlOptions {
                skip_patterns: vec!["(unclosed".to_string()],
                ..options("https://a.go.kr/")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, crate::ScoutError::Config(_)));

        let err = crawler.crawl(options("not a url")).await.unwrap_err();
        assert!(matches!(err, crate::ScoutError::UrlError(_)));

        assert!(!site.is_initialized());
        assert_eq!(site.close_count(), 0);
    }
}
