//! Static HTML renderer over reqwest
//!
//! There is no JavaScript engine here: every wait strategy resolves once the
//! response body has been read, and sub-resources are never loaded, so the
//! interception policy is trivially honored.

use crate::renderer::{
    InterceptionPolicy, NavigationResponse, PageRenderer, RenderError, RendererOptions,
    WaitStrategy,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Maximum redirect hops followed per navigation
const MAX_REDIRECTS: usize = 10;

/// Renderer that fetches pages with a plain HTTP client
#[derive(Default)]
pub struct HttpRenderer {
    client: Option<Client>,
    current: Option<String>,
    interception: InterceptionPolicy,
}

impl HttpRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interception policy last set on this renderer
    pub fn interception(&self) -> &InterceptionPolicy {
        &self.interception
    }
}

/// Builds the HTTP client used for navigations
fn build_client(options: &RendererOptions) -> Result<Client, RenderError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &options.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| RenderError::Network(format!("invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| RenderError::Network(format!("invalid header value: {}", e)))?;
        headers.insert(name, value);
    }

    Client::builder()
        .user_agent(options.user_agent.clone())
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(|e| RenderError::Network(e.to_string()))
}

fn classify(error: reqwest::Error, timeout: Duration) -> RenderError {
    if error.is_timeout() {
        RenderError::Timeout(timeout.as_millis() as u64)
    } else {
        RenderError::Network(error.to_string())
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn initialize(&mut self, options: &RendererOptions) -> Result<(), RenderError> {
        self.client = Some(build_client(options)?);
        self.current = None;
        Ok(())
    }

    async fn set_interception(&mut self, policy: InterceptionPolicy) -> Result<(), RenderError> {
        self.interception = policy;
        Ok(())
    }

    async fn goto(
        &mut self,
        url: &Url,
        wait: WaitStrategy,
        timeout: Duration,
    ) -> Result<NavigationResponse, RenderError> {
        let client = self.client.as_ref().ok_or(RenderError::NotInitialized)?;
        tracing::trace!("GET {} (wait: {:?})", url, wait);

        let response = client
            .get(url.as_str())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| classify(e, timeout))?;

        self.current = Some(body);

        Ok(NavigationResponse {
            ok: status.is_success(),
            status: status.as_u16(),
            final_url,
        })
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        if self.client.is_none() {
            return Err(RenderError::NotInitialized);
        }
        self.current
            .clone()
            .ok_or_else(|| RenderError::Extraction("no page loaded".to_string()))
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.client = None;
        self.current = None;
        Ok(())
    }
}
