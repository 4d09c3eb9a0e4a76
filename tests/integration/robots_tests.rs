//! Robots.txt handling through the politeness governor

use crate::common::{fast_politeness, governor, governor_with, mount_robots, USER_AGENT};
use portal_scout::config::PolitenessConfig;
use portal_scout::governor::MAX_CRAWL_DELAY;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn url(server: &MockServer, route: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), route)).expect("Failed to parse URL")
}

#[tokio::test]
async fn test_robots_fetched_once_within_ttl() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /admin", 1).await;

    let governor = governor();
    for route in ["/", "/notice", "/admin/users", "/about"] {
        governor.is_url_allowed(&url(&server, route), USER_AGENT).await;
    }
    governor
        .get_crawl_delay(&url(&server, "/"), USER_AGENT)
        .await;

    assert_eq!(governor.robots_cache_len().await, 1);
    // The server verifies the single robots.txt request when dropped
}

#[tokio::test]
async fn test_disallow_and_allow_rules() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        "User-agent: *\nDisallow: /admin\nDisallow: /*/print\nAllow: /admin/public",
        1,
    )
    .await;

    let governor = governor();
    let allowed = |route: &'static str| {
        let governor = governor.clone();
        let target = url(&server, route);
        async move { governor.is_url_allowed(&target, USER_AGENT).await }
    };

    assert!(allowed("/").await);
    assert!(allowed("/notice/list").await);
    assert!(!allowed("/admin").await);
    assert!(!allowed("/admin/users").await);
    assert!(allowed("/admin/public/faq").await);
    assert!(!allowed("/board/print?id=3").await);
}

#[tokio::test]
async fn test_user_agent_group_and_crawl_delay() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        "User-agent: TestBot\nCrawl-delay: 2.5\nDisallow: /private\n\n\
         User-agent: *\nDisallow: /",
        1,
    )
    .await;

    let governor = governor();
    assert!(governor.is_url_allowed(&url(&server, "/board"), USER_AGENT).await);
    assert!(!governor.is_url_allowed(&url(&server, "/private/x"), USER_AGENT).await);
    assert!(!governor.is_url_allowed(&url(&server, "/board"), "OtherBot/1.0").await);

    let delay = governor.get_crawl_delay(&url(&server, "/"), USER_AGENT).await;
    assert_eq!(delay, 2.5);

    let default_delay = governor.get_crawl_delay(&url(&server, "/"), "OtherBot/1.0").await;
    assert_eq!(default_delay, 0.0);
}

#[tokio::test]
async fn test_unavailable_robots_allows_everything() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let governor = governor();
    assert!(governor.is_url_allowed(&url(&server, "/admin"), USER_AGENT).await);
    assert!(governor.is_url_allowed(&url(&server, "/anything"), USER_AGENT).await);
}

#[tokio::test]
async fn test_missing_robots_allows_everything() {
    let server = MockServer::start().await;

    let governor = governor();
    assert!(governor.is_url_allowed(&url(&server, "/"), USER_AGENT).await);
    assert_eq!(
        governor.get_crawl_delay(&url(&server, "/"), USER_AGENT).await,
        0.0
    );
}

fn one_second_ttl() -> PolitenessConfig {
    PolitenessConfig {
        robots_ttl_secs: 1,
        ..fast_politeness()
    }
}

#[tokio::test]
async fn test_stale_robots_is_fetched_again() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /admin", 2).await;

    let governor = governor_with(one_second_ttl());
    assert!(!governor.is_url_allowed(&url(&server, "/admin"), USER_AGENT).await);
    assert!(governor.is_url_allowed(&url(&server, "/notice"), USER_AGENT).await);

    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert!(!governor.is_url_allowed(&url(&server, "/admin"), USER_AGENT).await);
    assert_eq!(governor.robots_cache_len().await, 1);
    // The server verifies exactly two robots.txt requests when dropped
}

#[tokio::test]
async fn test_cleanup_evicts_stale_robots() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /", 1).await;

    let governor = governor_with(one_second_ttl());
    governor.is_url_allowed(&url(&server, "/"), USER_AGENT).await;
    assert_eq!(governor.cleanup().await.robots_removed, 0);
    assert_eq!(governor.robots_cache_len().await, 1);

    tokio::time::sleep(Duration::from_millis(1200)).await;
    let stats = governor.cleanup().await;
    assert_eq!(stats.robots_removed, 1);
    assert_eq!(governor.robots_cache_len().await, 0);
}

#[tokio::test]
async fn test_huge_crawl_delay_is_capped() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nCrawl-delay: 1e20", 1).await;

    let governor = governor();
    let home = url(&server, "/");
    let delay = governor.get_crawl_delay(&home, USER_AGENT).await;
    assert_eq!(delay, MAX_CRAWL_DELAY.as_secs_f64());

    // No previous request, so nothing to wait for even with the capped delay
    let waited = governor.wait_for_next_request("crawler", Some(&home)).await;
    assert_eq!(waited, Duration::ZERO);
}
