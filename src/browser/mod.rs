//! Headless browser coordination.
//!
//! The browser runs elsewhere; this module finds it, keeps its control
//! endpoint cached and drives one render per request over CDP.
//!
//! # Module Structure
//!
//! - [`cache`] - Single-entry endpoint cache with an injectable clock
//! - [`discovery`] - HTTP lookup of `webSocketDebuggerUrl`
//! - [`probe`] - WebSocket handshake liveness check
//! - [`resolver`] - Cache, probe and discovery combined
//! - [`manager`] - Render orchestration
//!
//! # Example
//!
//! ```no_run
//! use pdfgen_lib::{BrowserManager, Config, PdfRenderer};
//! use std::path::Path;
//!
//! # async fn example() -> pdfgen_lib::Result<()> {
//! let manager = BrowserManager::from_config(&Config::default())?;
//! let url = url::Url::parse("https://example.com")?;
//! manager.render(&url, Path::new("/tmp/example.pdf")).await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod discovery;
pub mod manager;
mod page;
pub mod probe;
pub mod resolver;

pub use cache::{Clock, EndpointCache, SystemClock};
pub use discovery::{EndpointDiscovery, HttpDiscovery, DEFAULT_DISCOVERY_TIMEOUT};
pub use manager::{BrowserManager, PdfRenderer, NETWORK_ALMOST_IDLE};
pub use probe::{EndpointProbe, WebSocketProbe, DEFAULT_PROBE_TIMEOUT};
pub use resolver::{EndpointResolver, DEFAULT_ENDPOINT_TTL};
