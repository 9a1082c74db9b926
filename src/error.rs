use std::fmt;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;
use url::ParseError;

#[derive(Debug, Error)]
pub enum PdfGenError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Endpoint discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("{0}")]
    Render(#[from] RenderError),

    #[error("Rendered PDF missing at {}", .0.display())]
    ArtifactMissing(PathBuf),

    #[error("Render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Failed to delete {}: {source}", path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PdfGenError {
    pub fn config(message: impl Into<String>) -> Self {
        PdfGenError::Config(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        PdfGenError::InvalidRequest(message.into())
    }
}

pub type Result<T> = std::result::Result<T, PdfGenError>;

/// Failures reaching or reading the browser's discovery endpoint.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: StatusCode },

    #[error("{url} returned a body that is not JSON: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{url} response has no string webSocketDebuggerUrl field")]
    MissingEndpoint { url: String },
}

/// The step of a render session that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    ResolveEndpoint,
    Connect,
    OpenPage,
    Navigate,
    PrintToPdf,
}

impl RenderStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStage::ResolveEndpoint => "resolve-endpoint",
            RenderStage::Connect => "connect",
            RenderStage::OpenPage => "open-page",
            RenderStage::Navigate => "navigate",
            RenderStage::PrintToPdf => "print-to-pdf",
        }
    }
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Render failed during {stage}: {message}")]
pub struct RenderError {
    pub stage: RenderStage,
    pub message: String,
}

impl RenderError {
    pub fn new(stage: RenderStage, cause: impl fmt::Display) -> Self {
        Self {
            stage,
            message: cause.to_string(),
        }
    }
}
