//! End-to-end crawls over HTTP

use crate::common::{governor, mount_page, mount_robots, page, renderer_options};
use portal_scout::crawler::{CrawlReport, Crawler};
use portal_scout::renderer::HttpRenderer;
use portal_scout::storage::{SessionStatus, SqliteStorage};
use portal_scout::{CrawlOptions, CrawlStatus};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options(base_url: &str) -> CrawlOptions {
    CrawlOptions {
        start_url: format!("{}/", base_url),
        max_depth: 2,
        max_pages: 50,
        respect_robots_txt: true,
        crawl_delay_ms: 0,
        timeout_ms: 5000,
        ..CrawlOptions::default()
    }
}

async fn crawl(options: CrawlOptions) -> CrawlReport {
    let mut crawler = Crawler::new(HttpRenderer::new(), governor(), renderer_options());
    crawler
        .run(options, CancellationToken::new())
        .await
        .expect("Crawl failed")
}

/// Mounts a small portal: home, a notice board with one post, an about page
/// and an admin area
async fn mount_portal(server: &MockServer) {
    mount_page(
        server,
        "/",
        page(
            "Home",
            &["/notice", "/admin/secret", "/about", "https://other.example.com/"],
        ),
    )
    .await;
    mount_page(server, "/notice", page("Notices", &["/notice/1", "/"])).await;
    mount_page(server, "/notice/1", page("Notice 1", &["/notice/1/attachment"])).await;
    mount_page(server, "/about", page("About", &[])).await;
}

#[tokio::test]
async fn test_full_crawl_respects_robots() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_robots(&server, "User-agent: *\nDisallow: /admin", 1).await;
    mount_portal(&server).await;
    Mock::given(method("GET"))
        .and(path("/admin/secret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notice/1/attachment"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = crawl(options(&base_url)).await;

    let visited: Vec<(String, u32)> = report
        .nodes
        .iter()
        .map(|n| (n.url.clone(), n.level))
        .collect();
    assert_eq!(
        visited,
        vec![
            (format!("{}/", base_url), 0),
            (format!("{}/notice", base_url), 1),
            (format!("{}/about", base_url), 1),
            (format!("{}/notice/1", base_url), 2),
        ]
    );

    let titles: Vec<&str> = report.nodes.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["Home", "Notices", "About", "Notice 1"]);
    assert!(report
        .nodes
        .iter()
        .all(|n| n.crawl_status == CrawlStatus::Success));

    // Children are filled in on the returned nodes
    let home = &report.nodes[0];
    assert!(home.children.contains(&report.nodes[1].id));
    assert!(home.children.contains(&report.nodes[2].id));
    assert_eq!(report.nodes[3].parent_id.as_ref(), Some(&report.nodes[1].id));

    assert_eq!(report.stats.pages_crawled, 4);
    assert_eq!(report.stats.pages_failed, 0);
    assert!(report.stats.pages_skipped >= 1);
    assert_eq!(report.stats.max_level_reached, 2);
    assert!(report.stats.finished_at.is_some());
}

#[tokio::test]
async fn test_failed_pages_are_recorded() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, "/", page("Home", &["/missing", "/ok"])).await;
    mount_page(&server, "/ok", page("OK", &[])).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let report = crawl(CrawlOptions {
        respect_robots_txt: false,
        ..options(&base_url)
    })
    .await;

    assert_eq!(report.nodes.len(), 3);
    let missing = &report.nodes[1];
    assert_eq!(missing.url, format!("{}/missing", base_url));
    assert_eq!(missing.crawl_status, CrawlStatus::Failed);
    assert_eq!(missing.error.as_deref(), Some("HTTP 404"));
    assert_eq!(report.stats.pages_crawled, 2);
    assert_eq!(report.stats.pages_failed, 1);
}

#[tokio::test]
async fn test_max_pages_limits_requests() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, "/", page("Home", &["/a", "/b", "/c"])).await;
    mount_page(&server, "/a", page("A", &[])).await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = crawl(CrawlOptions {
        respect_robots_txt: false,
        max_pages: 2,
        ..options(&base_url)
    })
    .await;

    assert_eq!(report.nodes.len(), 2);
    assert_eq!(report.frontier_remaining, 2);
}

#[tokio::test]
async fn test_cancelled_crawl_records_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut crawler = Crawler::new(HttpRenderer::new(), governor(), renderer_options());
    let report = crawler
        .run(options(&server.uri()), cancel)
        .await
        .expect("Crawl failed");

    assert!(report.nodes.is_empty());
    assert_eq!(report.frontier_remaining, 1);
}

#[tokio::test]
async fn test_crawl_session_persists_to_sqlite() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_robots(&server, "User-agent: *\nAllow: /", 1).await;
    mount_portal(&server).await;
    mount_page(&server, "/admin/secret", page("Admin", &[])).await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("scout.db");

    let opts = CrawlOptions {
        max_depth: 1,
        ..options(&base_url)
    };
    let session_id = {
        let storage = SqliteStorage::new(&db_path).expect("Failed to open DB");
        let session_id = storage
            .create_session(&opts.start_url, "abc123")
            .await
            .expect("Failed to create session");

        let report = crawl(opts.clone()).await;
        storage
            .save_nodes(session_id, &report.nodes)
            .await
            .expect("Failed to save nodes");
        storage
            .complete_session(session_id, SessionStatus::Completed, &report.stats)
            .await
            .expect("Failed to complete session");
        session_id
    };

    let storage = SqliteStorage::new(&db_path).expect("Failed to reopen DB");
    let session = storage
        .get_session(session_id)
        .await
        .expect("Failed to load session");
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.start_url, opts.start_url);
    assert_eq!(session.config_hash, "abc123");
    assert!(session.finished_at.is_some());
    assert_eq!(
        session.stats.map(|s| s.pages_crawled),
        Some(4),
        "home, notice, admin and about are crawled at depth 1"
    );

    let nodes = storage
        .load_nodes(session_id)
        .await
        .expect("Failed to load nodes");
    let urls: Vec<String> = nodes.iter().map(|n| n.url.clone()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/", base_url),
            format!("{}/notice", base_url),
            format!("{}/admin/secret", base_url),
            format!("{}/about", base_url),
        ]
    );
    assert_eq!(nodes[0].children.len(), 3);
    assert!(nodes[1..]
        .iter()
        .all(|n| n.parent_id.as_ref() == Some(&nodes[0].id)));
    assert_eq!(
        storage.count_nodes(session_id).await.expect("Failed to count"),
        4
    );
}
