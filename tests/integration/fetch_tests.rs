//! Fetch executor over HTTP with the SQLite cache

use crate::common::{governor, mount_page, renderer_options};
use portal_scout::config::RetryConfig;
use portal_scout::fetcher::FetchExecutor;
use portal_scout::renderer::HttpRenderer;
use portal_scout::storage::SqliteStorage;
use portal_scout::ScrapeOptions;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NOTICE: &str = r#"<html lang="ko"><head><title>공지사항 - 민원 안내</title></head>
<body>
  <nav class="breadcrumb"><a href="/">홈</a> &gt; <a href="/notice">공지사항</a></nav>
  <main>
    <h1>민원 안내</h1>
    <p>주민등록   등본 발급은
       가까운 행정복지센터에서 가능합니다.</p>
    <img src="/img/map.png" alt="약도">
    <table>
      <caption>운영 시간</caption>
      <thead><tr><th>요일</th><th>시간</th></tr></thead>
      <tbody><tr><td>평일</td><td>09:00-18:00</td></tr></tbody>
    </table>
    <a href="/files/guide.pdf">안내서 내려받기</a>
  </main>
</body></html>"#;

fn fast_retry() -> RetryConfig {
    RetryConfig {
        base_delay_ms: 10,
        max_delay_ms: 100,
        retryable_errors: vec!["HTTP 503".to_string(), "timed out".to_string()],
        ..RetryConfig::default()
    }
}

fn executor(storage: Arc<SqliteStorage>) -> FetchExecutor<HttpRenderer, SqliteStorage> {
    FetchExecutor::new(
        HttpRenderer::new(),
        storage,
        governor(),
        fast_retry(),
        renderer_options(),
    )
}

fn storage() -> Arc<SqliteStorage> {
    Arc::new(SqliteStorage::new_in_memory().expect("Failed to open in-memory DB"))
}

#[tokio::test]
async fn test_fetch_extracts_document() {
    let server = MockServer::start().await;
    mount_page(&server, "/notice/1", NOTICE.to_string()).await;

    let executor = executor(storage());
    let url = format!("{}/notice/1", server.uri());
    let result = executor
        .scrape_page(&url, &ScrapeOptions::default())
        .await
        .expect("Fetch errored");
    executor.close().await.expect("Failed to close");

    assert!(result.success, "fetch failed: {:?}", result.error);
    assert_eq!(result.retry_count, 0);
    assert!(!result.from_cache);

    let document = result.document.expect("Missing document");
    assert_eq!(document.url, url);
    assert!(document.title.contains("민원 안내"));
    assert!(document
        .content
        .contains("주민등록 등본 발급은 가까운 행정복지센터에서 가능합니다."));
    assert_eq!(document.page_count, 1);

    assert_eq!(document.images.len(), 1);
    assert_eq!(document.images[0].alt.as_deref(), Some("약도"));

    assert_eq!(document.attachments.len(), 1);
    assert_eq!(document.attachments[0].extension.as_deref(), Some("pdf"));

    assert_eq!(document.tables.len(), 1);
    assert_eq!(document.tables[0].caption.as_deref(), Some("운영 시간"));
    assert_eq!(document.tables[0].headers, vec!["요일", "시간"]);
    assert_eq!(document.tables[0].rows, vec![vec!["평일", "09:00-18:00"]]);
}

#[tokio::test]
async fn test_second_fetch_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notice/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(NOTICE))
        .expect(1)
        .mount(&server)
        .await;

    let storage = storage();
    let executor = executor(Arc::clone(&storage));
    let url = format!("{}/notice/1", server.uri());

    let first = executor
        .scrape_page(&url, &ScrapeOptions::default())
        .await
        .expect("Fetch errored");
    let second = executor
        .scrape_page(&url, &ScrapeOptions::default())
        .await
        .expect("Fetch errored");

    assert!(first.success && second.success);
    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(first.document, second.document);
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_page(&server, "/busy", NOTICE.to_string()).await;

    let executor = executor(storage());
    let options = ScrapeOptions {
        use_cache: false,
        ..ScrapeOptions::default()
    };
    let result = executor
        .scrape_page(&format!("{}/busy", server.uri()), &options)
        .await
        .expect("Fetch errored");

    assert!(result.success);
    assert_eq!(result.retry_count, 2);
}

#[tokio::test]
async fn test_permanent_failure_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let executor = executor(storage());
    let result = executor
        .scrape_page(&format!("{}/gone", server.uri()), &ScrapeOptions::default())
        .await
        .expect("Fetch errored");

    assert!(!result.success);
    assert!(result.document.is_none());
    assert_eq!(result.error.as_deref(), Some("HTTP 404"));
    assert_eq!(result.retry_count, 0);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let executor = executor(storage());
    let options = ScrapeOptions {
        max_retries: 2,
        ..ScrapeOptions::default()
    };
    let result = executor
        .scrape_page(&format!("{}/down", server.uri()), &options)
        .await
        .expect("Fetch errored");

    assert!(!result.success);
    assert_eq!(result.retry_count, 2);
    assert_eq!(result.error.as_deref(), Some("HTTP 503"));
}

#[tokio::test]
async fn test_pagination_is_merged() {
    let server = MockServer::start().await;
    // Mounted first so the query-less mock below does not answer page 2
    Mock::given(method("GET"))
        .and(path("/board"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><head><title>게시판</title></head><body><p>둘째 페이지</p></body></html>",
        ))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/board",
        r#"<html><head><title>게시판</title></head><body>
           <p>첫 페이지</p><a rel="next" href="/board?page=2">다음</a></body></html>"#
            .to_string(),
    )
    .await;

    let executor = executor(storage());
    let options = ScrapeOptions {
        follow_pagination: true,
        use_cache: false,
        ..ScrapeOptions::default()
    };
    let result = executor
        .scrape_page(&format!("{}/board", server.uri()), &options)
        .await
        .expect("Fetch errored");

    let document = result.document.expect("Missing document");
    assert_eq!(document.page_count, 2);
    assert!(document.content.contains("첫 페이지"));
    assert!(document.content.contains("둘째 페이지"));
}
