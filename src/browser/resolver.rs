//! Resolves a usable control endpoint from the cache, re-discovering when the
//! cached one is missing or no longer answers.

use std::sync::Arc;
use std::time::Duration;

use super::cache::EndpointCache;
use super::discovery::EndpointDiscovery;
use super::probe::EndpointProbe;
use crate::error::DiscoveryError;

/// Cache entries live until proven stale by the probe.
pub const DEFAULT_ENDPOINT_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Clone)]
pub struct EndpointResolver {
    cache: EndpointCache,
    discovery: Arc<dyn EndpointDiscovery>,
    probe: Arc<dyn EndpointProbe>,
    ttl: Duration,
}

impl EndpointResolver {
    pub fn new(
        cache: EndpointCache,
        discovery: Arc<dyn EndpointDiscovery>,
        probe: Arc<dyn EndpointProbe>,
    ) -> Self {
        Self {
            cache,
            discovery,
            probe,
            ttl: DEFAULT_ENDPOINT_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn cache(&self) -> &EndpointCache {
        &self.cache
    }

    /// Every call pays one probe round trip on the cached path; a dead
    /// endpoint is never handed out without being re-discovered.
    pub async fn resolve(&self) -> Result<String, DiscoveryError> {
        if let Some(endpoint) = self.cache.get() {
            if self.probe.is_live(&endpoint).await {
                return Ok(endpoint);
            }
            tracing::info!(endpoint = %endpoint, "Cached endpoint is stale, rediscovering");
        }

        self.cache.invalidate();
        let endpoint = self.discovery.discover().await.map_err(|err| {
            tracing::error!(error = %err, "Could not get WebSocket debugger URL");
            err
        })?;
        self.cache.set(endpoint.clone(), self.ttl);
        Ok(endpoint)
    }
}
