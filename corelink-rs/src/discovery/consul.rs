//! Consul catalog backed monitor.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use corelink_core::monitor::compose_url;
use corelink_core::{
    ClientError, EndpointParams, HttpRequest, HttpTransport, HyperTransport, Monitor,
    RequestContext,
};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::encode_segment;

/// Upper bound for one catalog lookup.
const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Entry of `GET /v1/catalog/service/{name}`; only the fields needed to build a URL.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CatalogService {
    #[serde(default)]
    address: String,
    #[serde(default)]
    service_address: String,
    service_port: u16,
}

/// Resolves service keys through a Consul agent's catalog.
pub struct ConsulMonitor {
    consul_url: String,
    transport: Arc<dyn HttpTransport>,
    lookup_timeout: Duration,
}

impl ConsulMonitor {
    /// `consul_url` is the agent's base URL, e.g. `http://localhost:8500`.
    pub fn new(consul_url: &str) -> Self {
        Self::with_transport(consul_url, Arc::new(HyperTransport::new()))
    }

    pub fn with_transport(consul_url: &str, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            consul_url: consul_url.trim_end_matches('/').to_string(),
            transport,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Base URL (`http://host:port`) of the first catalog entry, `None` if the service is unknown.
    pub async fn lookup(&self, service_key: &str) -> Result<Option<String>, ClientError> {
        let url = format!(
            "{}/v1/catalog/service/{}",
            self.consul_url,
            encode_segment(service_key)
        );
        let ctx = RequestContext::background().with_timeout(self.lookup_timeout);
        let entries: Vec<CatalogService> = ctx
            .run(async {
                self.transport
                    .send(HttpRequest::get(url))
                    .await?
                    .error_for_status()?
                    .json()
            })
            .await?;
        Ok(entries.into_iter().next().map(|entry| {
            let host = if entry.service_address.is_empty() {
                entry.address
            } else {
                entry.service_address
            };
            format!("http://{}:{}", host, entry.service_port)
        }))
    }
}

#[async_trait]
impl Monitor for ConsulMonitor {
    async fn monitor(&self, params: &EndpointParams, tx: mpsc::Sender<String>) {
        let url = if params.service_key.is_empty() || params.path.is_empty() {
            String::new()
        } else {
            match self.lookup(&params.service_key).await {
                Ok(Some(base)) => compose_url(&base, &params.path),
                Ok(None) => {
                    tracing::warn!(service = %params.service_key, "service not registered in consul");
                    String::new()
                }
                Err(e) => {
                    tracing::warn!(service = %params.service_key, error = %e, "consul lookup failed");
                    String::new()
                }
            }
        };
        let _ = tx.send(url).await;
    }
}
