//! PDF Generator Library
//!
//! Renders URLs to PDF through a headless Chromium that is managed elsewhere
//! and reachable over the Chrome DevTools Protocol.
//!
//! # Module Overview
//!
//! - [`browser`] - Control-endpoint caching, discovery, probing and rendering
//! - [`server`] - HTTP handler (`POST /pdf`) and router
//! - [`artifact`] - Per-request temporary PDF files
//! - [`config`] - Configuration file support
//! - [`dimension`] - Paper and margin lengths
//!
//! # Example
//!
//! ```no_run
//! use pdfgen_lib::{server, Config};
//!
//! # async fn example() -> pdfgen_lib::Result<()> {
//! let config = Config::load(None)?;
//! server::serve(&config).await?;
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod browser;
pub mod config;
pub mod dimension;
pub mod error;
pub mod server;

pub use artifact::TempArtifact;
pub use browser::{
    BrowserManager, Clock, EndpointCache, EndpointDiscovery, EndpointProbe, EndpointResolver,
    HttpDiscovery, PdfRenderer, SystemClock, WebSocketProbe, DEFAULT_ENDPOINT_TTL,
};
pub use config::{BrowserConfig, Config, PdfOptions, ServerConfig};
pub use dimension::Dimension;
pub use error::{DiscoveryError, PdfGenError, RenderError, RenderStage, Result};
pub use server::{router, AppState};
