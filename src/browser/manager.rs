//! Render orchestration against the shared, externally managed browser.
//!
//! One render is: resolve the control endpoint, connect, open a page, navigate
//! and wait for the network to settle, print to PDF, close the page and
//! disconnect. The browser process itself is left running.

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{
    EventLifecycleEvent, NavigateParams, PrintToPdfParams, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::handler::{Handler, HandlerConfig};
use chromiumoxide::Browser;
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use url::Url;

use super::cache::EndpointCache;
use super::discovery::HttpDiscovery;
use super::page::PageGuard;
use super::probe::WebSocketProbe;
use super::resolver::EndpointResolver;
use crate::config::{Config, PdfOptions};
use crate::error::{RenderError, RenderStage};
use crate::Result;

/// Chromium fires this once no more than two connections have been in flight
/// for 500ms.
pub const NETWORK_ALMOST_IDLE: &str = "networkAlmostIdle";

/// First lifecycle event of a new document in a frame.
const LIFECYCLE_INIT: &str = "init";

/// CDP command timeout. Navigation is not bounded by us, so this is only a
/// backstop against a wedged browser.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    /// Render `url` into a PDF at `output`.
    async fn render(&self, url: &Url, output: &Path) -> std::result::Result<(), RenderError>;
}

/// Drives renders against the browser behind the resolved control endpoint,
/// at most `max_concurrent_renders` at a time.
#[derive(Clone)]
pub struct BrowserManager {
    resolver: EndpointResolver,
    pdf: PdfOptions,
    semaphore: Arc<Semaphore>,
    command_timeout: Duration,
}

impl BrowserManager {
    pub fn new(
        resolver: EndpointResolver,
        pdf: PdfOptions,
        max_concurrent_renders: usize,
    ) -> Self {
        Self {
            resolver,
            pdf,
            semaphore: Arc::new(Semaphore::new(max_concurrent_renders.max(1))),
            command_timeout: COMMAND_TIMEOUT,
        }
    }

    /// Bound on a single CDP command. Navigation waits are not affected.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Wire up HTTP discovery, the WebSocket probe and a fresh cache from config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let browser = &config.browser;
        let discovery =
            HttpDiscovery::with_timeout(browser.discovery_url.clone(), browser.discovery_timeout)?;
        let resolver = EndpointResolver::new(
            EndpointCache::new(),
            Arc::new(discovery),
            Arc::new(WebSocketProbe::new(browser.probe_timeout)),
        )
        .with_ttl(browser.endpoint_ttl);

        Ok(Self::new(
            resolver,
            config.pdf.clone(),
            browser.max_concurrent_renders,
        ))
    }

    pub fn resolver(&self) -> &EndpointResolver {
        &self.resolver
    }

    async fn render_session(
        &self,
        url: &Url,
        output: &Path,
    ) -> std::result::Result<(), RenderError> {
        let endpoint = self
            .resolver
            .resolve()
            .await
            .map_err(|e| RenderError::new(RenderStage::ResolveEndpoint, e))?;

        let config = HandlerConfig {
            request_timeout: self.command_timeout,
            ..HandlerConfig::default()
        };
        let (browser, handler) = Browser::connect_with_config(endpoint.as_str(), config)
            .await
            .map_err(|e| RenderError::new(RenderStage::Connect, e))?;
        let connection = Connection::new(browser, handler);

        let outcome = self.render_page(&connection.browser, url, output).await;
        connection.disconnect();
        outcome
    }

    async fn render_page(
        &self,
        browser: &Browser,
        url: &Url,
        output: &Path,
    ) -> std::result::Result<(), RenderError> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::new(RenderStage::OpenPage, e))?;
        let page = PageGuard::new(page);

        let outcome = async {
            navigate_until_idle(&page, url).await?;
            page.page()
                .save_pdf(pdf_params(&self.pdf), output)
                .await
                .map_err(|e| RenderError::new(RenderStage::PrintToPdf, e))?;
            Ok(())
        }
        .await;

        page.close().await;
        outcome
    }
}

#[async_trait]
impl PdfRenderer for BrowserManager {
    async fn render(&self, url: &Url, output: &Path) -> std::result::Result<(), RenderError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| {
                RenderError::new(RenderStage::ResolveEndpoint, "render queue closed")
            })?;

        let start = Instant::now();
        match self.render_session(url, output).await {
            Ok(()) => {
                tracing::info!(
                    url = %url,
                    path = %output.display(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Rendered PDF"
                );
                Ok(())
            }
            Err(err) => {
                tracing::error!(
                    url = %url,
                    stage = %err.stage,
                    error = %err.message,
                    "Could not generate PDF"
                );
                Err(err)
            }
        }
    }
}

/// A connected browser plus the task pumping its CDP handler.
struct Connection {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl Connection {
    fn new(browser: Browser, mut handler: Handler) -> Self {
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    tracing::debug!(error = %err, "CDP handler error");
                }
            }
        });
        Self { browser, handler }
    }

    /// Drop the WebSocket without closing the remote browser.
    fn disconnect(self) {
        drop(self);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Navigate with no timeout and wait until the main frame's current document
/// reports `networkAlmostIdle`.
async fn navigate_until_idle(
    page: &PageGuard,
    url: &Url,
) -> std::result::Result<(), RenderError> {
    let page = page.page();
    let navigate_error =
        |e: chromiumoxide::error::CdpError| RenderError::new(RenderStage::Navigate, e);

    // Subscribe before navigating so the idle event cannot be missed.
    let mut lifecycle = page
        .event_listener::<EventLifecycleEvent>()
        .await
        .map_err(navigate_error)?;
    page.execute(SetLifecycleEventsEnabledParams::new(true))
        .await
        .map_err(navigate_error)?;

    let navigation = page
        .execute(NavigateParams::new(url.as_str()))
        .await
        .map_err(navigate_error)?;
    if let Some(error_text) = navigation.error_text.as_deref() {
        return Err(RenderError::new(RenderStage::Navigate, error_text));
    }
    // Same-document navigations have no loader and load nothing.
    let Some(loader_id) = navigation.loader_id.as_ref() else {
        return Ok(());
    };
    let mut idle = IdleTracker::new(navigation.frame_id.inner(), loader_id.inner());

    while let Some(event) = lifecycle.next().await {
        if idle.observe(event.frame_id.inner(), event.loader_id.inner(), &event.name) {
            tracing::debug!(url = %url, "Network almost idle");
            return Ok(());
        }
    }

    Err(RenderError::new(
        RenderStage::Navigate,
        "connection closed before the page settled",
    ))
}

/// Follows the main frame's loader across client-side redirects.
///
/// Events are ignored until the navigation's own loader shows up, which skips
/// anything left over from the blank page. After that every `init` for the
/// frame moves the tracker to the new document's loader.
#[derive(Debug)]
struct IdleTracker {
    frame_id: String,
    first_loader: String,
    current_loader: Option<String>,
}

impl IdleTracker {
    fn new(frame_id: &str, loader_id: &str) -> Self {
        Self {
            frame_id: frame_id.to_string(),
            first_loader: loader_id.to_string(),
            current_loader: None,
        }
    }

    /// Feed one lifecycle event; true once the current document is idle.
    fn observe(&mut self, frame_id: &str, loader_id: &str, name: &str) -> bool {
        if frame_id != self.frame_id {
            return false;
        }
        if self.current_loader.is_none() {
            if loader_id != self.first_loader {
                return false;
            }
            self.current_loader = Some(loader_id.to_string());
        }
        if name == LIFECYCLE_INIT {
            self.current_loader = Some(loader_id.to_string());
        }
        name == NETWORK_ALMOST_IDLE && self.current_loader.as_deref() == Some(loader_id)
    }
}

fn pdf_params(options: &PdfOptions) -> PrintToPdfParams {
    PrintToPdfParams {
        print_background: Some(true),
        paper_width: Some(options.page_width.inches()),
        paper_height: Some(options.page_height.inches()),
        margin_top: Some(options.margin_top.inches()),
        margin_right: Some(options.margin_right.inches()),
        margin_bottom: Some(options.margin_bottom.inches()),
        margin_left: Some(options.margin_left.inches()),
        ..PrintToPdfParams::default()
    }
}
