//! corelink core: endpoint parameters, registry monitor, endpoint watcher, HTTP transport.

pub mod context;
pub mod endpoint;
pub mod http;
pub mod into_client_error;
pub mod monitor;
pub mod service_discovery;
pub mod watcher;

pub use context::RequestContext;
pub use endpoint::{Endpoint, EndpointParams, CLIENT_MONITOR_DEFAULT};
pub use into_client_error::IntoClientError;
pub use self::http::{HttpRequest, HttpResponse, HttpTransport, HyperTransport, Method};
pub use monitor::{DiscoveryMonitor, Monitor};
pub use service_discovery::ServiceDiscovery;
pub use watcher::{EndpointWatcher, WatcherHandle};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("no endpoint resolved yet for service {service_key:?}")]
    Unresolved { service_key: String },
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request failed with status {code}: {body}")]
    Status { code: u16, body: String },
    #[error("invalid JSON in response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("cannot encode request body: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("request cancelled")]
    Cancelled,
    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

impl ClientError {
    /// Status code for protocol failures (non-2xx responses).
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}
