//! In-memory renderer
//!
//! Serves pages from a URL map. Clones share state, so a caller can hand one
//! clone to a crawler and inspect navigations through another.

use crate::renderer::{
    InterceptionPolicy, NavigationResponse, PageRenderer, RenderError, RendererOptions,
    WaitStrategy,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
struct StaticPage {
    status: u16,
    html: String,
}

#[derive(Debug, Default)]
struct StaticSite {
    pages: HashMap<String, StaticPage>,
    /// Remaining forced failures per URL
    failures: HashMap<String, (u32, RenderError)>,
    navigations: Vec<String>,
    initialized: bool,
    close_count: u32,
    current: Option<String>,
    options: Option<RendererOptions>,
    interception: Option<InterceptionPolicy>,
}

/// Renderer backed by a fixed set of pages
///
/// Unknown URLs answer with a 404 and an empty body.
#[derive(Debug, Clone, Default)]
pub struct StaticRenderer {
    site: Arc<Mutex<StaticSite>>,
}

fn page_key(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}

impl StaticRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn site(&self) -> MutexGuard<'_, StaticSite> {
        self.site.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serves `html` with status 200 at `url`
    pub fn with_page(self, url: &str, html: impl Into<String>) -> Self {
        self.with_status(url, 200, html)
    }

    /// Serves `html` with the given status at `url`
    pub fn with_status(self, url: &str, status: u16, html: impl Into<String>) -> Self {
        self.site().pages.insert(
            page_key(url),
            StaticPage {
                status,
                html: html.into(),
            },
        );
        self
    }

    /// Makes the next `times` navigations to `url` fail with `error`
    pub fn fail_times(self, url: &str, times: u32, error: RenderError) -> Self {
        self.site().failures.insert(page_key(url), (times, error));
        self
    }

    /// URLs navigated to, in order
    pub fn navigations(&self) -> Vec<String> {
        self.site().navigations.clone()
    }

    /// Number of navigations to `url`
    pub fn navigation_count(&self, url: &str) -> usize {
        let key = page_key(url);
        self.site().navigations.iter().filter(|u| **u == key).count()
    }

    pub fn is_initialized(&self) -> bool {
        self.site().initialized
    }

    /// How many times `close()` was called
    pub fn close_count(&self) -> u32 {
        self.site().close_count
    }

    /// Options passed to the last `initialize()`
    pub fn options(&self) -> Option<RendererOptions> {
        self.site().options.clone()
    }

    /// Policy passed to the last `set_interception()`
    pub fn interception(&self) -> Option<InterceptionPolicy> {
        self.site().interception.clone()
    }
}

#[async_trait]
impl PageRenderer for StaticRenderer {
    async fn initialize(&mut self, options: &RendererOptions) -> Result<(), RenderError> {
        let mut site = self.site();
        site.initialized = true;
        site.options = Some(options.clone());
        site.current = None;
        Ok(())
    }

    async fn set_interception(&mut self, policy: InterceptionPolicy) -> Result<(), RenderError> {
        self.site().interception = Some(policy);
        Ok(())
    }

    async fn goto(
        &mut self,
        url: &Url,
        _wait: WaitStrategy,
        _timeout: Duration,
    ) -> Result<NavigationResponse, RenderError> {
        let mut site = self.site();
        if !site.initialized {
            return Err(RenderError::NotInitialized);
        }

        let key = url.to_string();
        site.navigations.push(key.clone());

        if let Some((remaining, error)) = site.failures.get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                let error = error.clone();
                site.current = None;
                return Err(error);
            }
        }

        let page = site.pages.get(&key).cloned().unwrap_or(StaticPage {
            status: 404,
            html: String::new(),
        });
        site.current = Some(page.html);

        Ok(NavigationResponse {
            ok: (200..300).contains(&page.status),
            status: page.status,
            final_url: url.clone(),
        })
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        let site = self.site();
        if !site.initialized {
            return Err(RenderError::NotInitialized);
        }
        site.current
            .clone()
            .ok_or_else(|| RenderError::Extraction("no page loaded".to_string()))
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        let mut site = self.site();
        site.initialized = false;
        site.current = None;
        site.close_count += 1;
        Ok(())
    }
}
