use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::dimension::Dimension;
use crate::{PdfGenError, Result};

/// Chromium's version endpoint; it reports the browser-level `webSocketDebuggerUrl`.
pub const DEFAULT_DISCOVERY_URL: &str = "http://127.0.0.1:9222/json/version";

pub const ENV_BIND: &str = "PDFGEN_BIND";
pub const ENV_DISCOVERY_URL: &str = "PDFGEN_DISCOVERY_URL";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub browser: BrowserConfig,
    pub pdf: PdfOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Where rendered PDFs are staged; the platform temp dir when unset.
    pub temp_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            temp_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrowserConfig {
    pub discovery_url: String,
    #[serde(with = "humantime_serde")]
    pub discovery_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub probe_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub endpoint_ttl: Duration,
    pub max_concurrent_renders: usize,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            discovery_url: DEFAULT_DISCOVERY_URL.to_string(),
            discovery_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(5),
            endpoint_ttl: Duration::from_secs(365 * 24 * 60 * 60),
            max_concurrent_renders: 4,
        }
    }
}

/// Paper size and margins handed to the browser's print-to-PDF call.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PdfOptions {
    pub page_width: Dimension,
    pub page_height: Dimension,
    pub margin_top: Dimension,
    pub margin_right: Dimension,
    pub margin_bottom: Dimension,
    pub margin_left: Dimension,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            page_width: Dimension::from_inches(8.5),
            page_height: Dimension::from_inches(11.0),
            margin_top: Dimension::from_inches(0.4),
            margin_right: Dimension::from_inches(0.4),
            margin_bottom: Dimension::from_inches(0.4),
            margin_left: Dimension::from_inches(0.4),
        }
    }
}

impl Config {
    /// Load from an explicit TOML file, or defaults when no path is given.
    /// Environment overrides are applied afterwards in both cases.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    PdfGenError::config(format!("Failed to read config {}: {}", path.display(), e))
                })?;
                Self::from_toml_str(&text).map_err(|e| match e {
                    PdfGenError::Config(msg) => {
                        PdfGenError::config(format!("{} ({})", msg, path.display()))
                    }
                    other => other,
                })?
            }
            None => Config::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| PdfGenError::config(format!("Invalid config: {}", e)))
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(bind) = non_empty_env(ENV_BIND) {
            self.server.bind = bind
                .parse()
                .map_err(|e| PdfGenError::config(format!("{ENV_BIND}={bind}: {e}")))?;
        }
        if let Some(url) = non_empty_env(ENV_DISCOVERY_URL) {
            self.browser.discovery_url = url;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.browser.discovery_url).map_err(|e| {
            PdfGenError::config(format!(
                "discovery_url '{}' is not an absolute URL: {}",
                self.browser.discovery_url, e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PdfGenError::config(format!(
                "discovery_url must be http(s), got '{}'",
                url.scheme()
            )));
        }
        if self.browser.max_concurrent_renders == 0 {
            return Err(PdfGenError::config(
                "max_concurrent_renders must be at least 1",
            ));
        }
        if self.browser.discovery_timeout.is_zero() || self.browser.probe_timeout.is_zero() {
            return Err(PdfGenError::config("timeouts must be greater than zero"));
        }
        if self.pdf.page_width.pixels() <= 0.0 || self.pdf.page_height.pixels() <= 0.0 {
            return Err(PdfGenError::config("page_width and page_height must be positive"));
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
