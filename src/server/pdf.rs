//! `POST /pdf`: render a URL and return the PDF as a download.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use url::Url;

use super::error::AppError;
use super::AppState;
use crate::artifact::TempArtifact;
use crate::{PdfGenError, Result};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, Deserialize)]
pub struct RenderRequest {
    #[serde(alias = "Url")]
    pub url: String,
    #[serde(alias = "Filename")]
    pub filename: String,
}

impl RenderRequest {
    pub fn target(&self) -> Result<Url> {
        let url = Url::parse(self.url.trim())?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(PdfGenError::invalid_request(format!(
                "unsupported URL scheme '{other}'"
            ))),
        }
    }
}

/// `attachment; filename=<name>` with everything outside the RFC 3986
/// unreserved set percent-encoded.
pub fn content_disposition(filename: &str) -> String {
    format!("attachment; filename={}", urlencoding::encode(filename))
}

pub async fn generate_pdf(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RenderRequest>, JsonRejection>,
) -> std::result::Result<Response, AppError> {
    let Json(request) =
        payload.map_err(|rejection| PdfGenError::invalid_request(rejection.body_text()))?;
    let target = request.target()?;

    // Runs to completion even if the client goes away, so the file is
    // always removed.
    let bytes = tokio::spawn(render_and_clean_up(state, target)).await??;

    let disposition = HeaderValue::from_str(&content_disposition(&request.filename))
        .map_err(|e| PdfGenError::invalid_request(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(PDF_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn render_and_clean_up(state: AppState, target: Url) -> Result<Vec<u8>> {
    let artifact = TempArtifact::allocate(&state.temp_dir);
    let rendered = render_to_bytes(&state, &target, &artifact).await;
    // Clean up before looking at the outcome; a failed delete fails the request.
    let cleanup = artifact.remove().await;
    let bytes = rendered?;
    cleanup?;
    Ok(bytes)
}

async fn render_to_bytes(
    state: &AppState,
    target: &Url,
    artifact: &TempArtifact,
) -> Result<Vec<u8>> {
    state.renderer.render(target, artifact.path()).await?;
    artifact.read().await
}
