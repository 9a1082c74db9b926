//! HTTP-facing error type.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::PdfGenError;

/// Any failure on the request path. Clients always get a bare 500; the cause
/// only goes to the log.
#[derive(Debug)]
pub struct AppError(pub PdfGenError);

impl<E> From<E> for AppError
where
    E: Into<PdfGenError>,
{
    fn from(err: E) -> Self {
        AppError(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "Could not generate PDF");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}
