//! HTTP surface: `POST /pdf` plus a health check.

use axum::{
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use crate::browser::{BrowserManager, PdfRenderer};
use crate::config::Config;
use crate::Result;

mod error;
pub mod health;
pub mod pdf;

pub use error::AppError;
pub use pdf::{content_disposition, RenderRequest, PDF_CONTENT_TYPE};

#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<dyn PdfRenderer>,
    pub temp_dir: PathBuf,
}

impl AppState {
    pub fn new(renderer: Arc<dyn PdfRenderer>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            renderer,
            temp_dir: temp_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let manager = BrowserManager::from_config(config)?;
        Ok(Self::new(Arc::new(manager), config.server.temp_dir()))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/pdf", post(pdf::generate_pdf))
        .route("/PDF", post(pdf::generate_pdf))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn serve(config: &Config) -> Result<()> {
    let state = AppState::from_config(config)?;
    tokio::fs::create_dir_all(&state.temp_dir).await?;

    let listener = TcpListener::bind(config.server.bind).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        discovery_url = %config.browser.discovery_url,
        temp_dir = %state.temp_dir.display(),
        "pdfgen listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
