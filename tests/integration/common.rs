//! Shared fixtures for the integration tests

use portal_scout::config::PolitenessConfig;
use portal_scout::renderer::RendererOptions;
use portal_scout::PolitenessGovernor;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USER_AGENT: &str = "TestBot/1.0 (+https://example.com/bot; bot@example.com)";

/// Politeness settings fast enough for real-time tests
pub fn fast_politeness() -> PolitenessConfig {
    PolitenessConfig {
        requests_per_second: 100.0,
        burst_size: 1000,
        default_crawl_delay_secs: 0.0,
        robots_timeout_ms: 2000,
        ..PolitenessConfig::default()
    }
}

pub fn governor() -> Arc<PolitenessGovernor> {
    governor_with(fast_politeness())
}

pub fn governor_with(config: PolitenessConfig) -> Arc<PolitenessGovernor> {
    Arc::new(PolitenessGovernor::new(config, USER_AGENT).expect("Failed to build governor"))
}

pub fn renderer_options() -> RendererOptions {
    RendererOptions {
        user_agent: USER_AGENT.to_string(),
        headers: vec![("Accept-Language".to_string(), "ko-KR".to_string())],
    }
}

/// Mounts an HTML page at `route`
pub async fn mount_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

/// Mounts a robots.txt that must be requested exactly `times` times
pub async fn mount_robots(server: &MockServer, body: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(times)
        .mount(server)
        .await;
}

/// A page whose body links to `hrefs`
pub fn page(title: &str, hrefs: &[&str]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|h| format!(r#"<li><a href="{}">{}</a></li>"#, h, h))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body><ul>{}</ul></body></html>",
        title, anchors
    )
}
