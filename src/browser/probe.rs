//! Liveness probe for a cached control endpoint.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait EndpointProbe: Send + Sync {
    /// Whether `endpoint` accepts a control-channel handshake right now.
    ///
    /// Every failure collapses to `false`. A `true` is not a reservation; the
    /// browser may still go away before the endpoint is used.
    async fn is_live(&self, endpoint: &str) -> bool;
}

/// Probes an endpoint by completing a WebSocket handshake and then dropping
/// the connection without a close frame.
#[derive(Debug, Clone)]
pub struct WebSocketProbe {
    timeout: Duration,
}

impl Default for WebSocketProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

impl WebSocketProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl EndpointProbe for WebSocketProbe {
    async fn is_live(&self, endpoint: &str) -> bool {
        match timeout(self.timeout, tokio_tungstenite::connect_async(endpoint)).await {
            Ok(Ok((socket, _response))) => {
                drop(socket);
                tracing::debug!(endpoint, "WebSocket debugger URL tested OK");
                true
            }
            Ok(Err(err)) => {
                tracing::info!(endpoint, error = %err, "WebSocket debugger URL tested NOT OK");
                false
            }
            Err(_) => {
                tracing::info!(
                    endpoint,
                    timeout = ?self.timeout,
                    "WebSocket debugger URL handshake timed out"
                );
                false
            }
        }
    }
}
