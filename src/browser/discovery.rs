//! Looks up the browser's control endpoint from its HTTP discovery address.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::error::DiscoveryError;
use crate::{PdfGenError, Result};

pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

const ENDPOINT_FIELD: &str = "webSocketDebuggerUrl";

#[async_trait]
pub trait EndpointDiscovery: Send + Sync {
    /// Fetch the control endpoint currently advertised by the browser.
    async fn discover(&self) -> std::result::Result<String, DiscoveryError>;
}

#[derive(Debug, Clone)]
pub struct HttpDiscovery {
    http: Client,
    url: String,
}

impl HttpDiscovery {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_DISCOVERY_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PdfGenError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EndpointDiscovery for HttpDiscovery {
    async fn discover(&self) -> std::result::Result<String, DiscoveryError> {
        let request_error = |source: reqwest::Error| DiscoveryError::Request {
            url: self.url.clone(),
            source,
        };

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status {
                url: self.url.clone(),
                status,
            });
        }

        let body = response.text().await.map_err(request_error)?;
        let endpoint = parse_endpoint(&self.url, &body)?;

        tracing::info!(endpoint = %endpoint, "Got WebSocket debugger URL");
        Ok(endpoint)
    }
}

fn parse_endpoint(url: &str, body: &str) -> std::result::Result<String, DiscoveryError> {
    let value: Value = serde_json::from_str(body).map_err(|source| DiscoveryError::Parse {
        url: url.to_string(),
        source,
    })?;

    value
        .get(ENDPOINT_FIELD)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| DiscoveryError::MissingEndpoint {
            url: url.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use std::net::SocketAddr;

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn discovery_for(addr: SocketAddr) -> HttpDiscovery {
        HttpDiscovery::with_timeout(
            format!("http://{addr}/json/version"),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[test]
    fn parse_endpoint_reads_field() {
        let endpoint = parse_endpoint(
            "http://x",
            r#"{"Browser":"HeadlessChrome/120","webSocketDebuggerUrl":"ws://host:1/devtools/browser/abc"}"#,
        )
        .unwrap();

        assert_eq!(endpoint, "ws://host:1/devtools/browser/abc");
    }

    #[test]
    fn parse_endpoint_rejects_non_string_field() {
        let err = parse_endpoint("http://x", r#"{"webSocketDebuggerUrl":42}"#).unwrap_err();

        assert!(matches!(err, DiscoveryError::MissingEndpoint { .. }));
    }

    #[test]
    fn parse_endpoint_rejects_non_object() {
        let err = parse_endpoint("http://x", r#"["ws://host"]"#).unwrap_err();
        assert!(matches!(err, DiscoveryError::MissingEndpoint { .. }));

        let err = parse_endpoint("http://x", "<html>").unwrap_err();
        assert!(matches!(err, DiscoveryError::Parse { .. }));
    }

    #[tokio::test]
    async fn discover_returns_advertised_endpoint() {
        let router = Router::new().route(
            "/json/version",
            get(|| async { r#"{"webSocketDebuggerUrl":"ws://host:1/devtools/browser/abc"}"# }),
        );
        let addr = serve(router).await;

        let endpoint = discovery_for(addr).discover().await.unwrap();

        assert_eq!(endpoint, "ws://host:1/devtools/browser/abc");
    }

    #[tokio::test]
    async fn discover_fails_on_error_status() {
        let router = Router::new().route(
            "/json/version",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "starting") }),
        );
        let addr = serve(router).await;

        let err = discovery_for(addr).discover().await.unwrap_err();

        assert!(matches!(err, DiscoveryError::Status { status, .. } if status.as_u16() == 503));
    }

    #[tokio::test]
    async fn discover_fails_when_unreachable() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = discovery_for(addr).discover().await.unwrap_err();

        assert!(matches!(err, DiscoveryError::Request { .. }));
    }

    #[tokio::test]
    async fn discover_times_out() {
        let router = Router::new().route(
            "/json/version",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "{}"
            }),
        );
        let addr = serve(router).await;
        let discovery = HttpDiscovery::with_timeout(
            format!("http://{addr}/json/version"),
            Duration::from_millis(200),
        )
        .unwrap();

        let err = discovery.discover().await.unwrap_err();

        assert!(matches!(err, DiscoveryError::Request { ref source, .. } if source.is_timeout()));
    }
}
