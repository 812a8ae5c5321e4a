//! Monitor: resolve the current URL of a service and deliver it on a channel.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::endpoint::EndpointParams;
use crate::service_discovery::ServiceDiscovery;

/// Resolves `params.service_key` to a full URL (`base + params.path`) and sends it on `tx`.
/// On failure it sends an empty string instead of an error. Each call is independent.
#[async_trait]
pub trait Monitor: Send + Sync {
    async fn monitor(&self, params: &EndpointParams, tx: mpsc::Sender<String>);
}

/// Monitor over a synchronous [`ServiceDiscovery`]: takes the first URL it returns.
pub struct DiscoveryMonitor<D> {
    discovery: D,
}

impl<D: ServiceDiscovery> DiscoveryMonitor<D> {
    pub fn new(discovery: D) -> Self {
        Self { discovery }
    }
}

/// Join base URL and path without doubling or dropping the slash between them.
pub fn compose_url(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[async_trait]
impl<D: ServiceDiscovery> Monitor for DiscoveryMonitor<D> {
    async fn monitor(&self, params: &EndpointParams, tx: mpsc::Sender<String>) {
        if params.service_key.is_empty() || params.path.is_empty() {
            let _ = tx.send(String::new()).await;
            return;
        }
        let url = match self.discovery.resolve(&params.service_key).first() {
            Some(base) => compose_url(base, &params.path),
            None => String::new(),
        };
        let _ = tx.send(url).await;
    }
}
