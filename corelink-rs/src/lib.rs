//! corelink for Rust: value descriptor client over a static or registry-resolved endpoint.

pub mod clients;
pub mod config;
pub mod coredata;
pub mod discovery;

pub use clients::{API_VALUE_DESCRIPTOR_ROUTE, CORE_DATA_SERVICE_KEY};
pub use config::{consul_url_from_env, load_params, select_discovery, ConfigError};
pub use coredata::{ValueDescriptor, ValueDescriptorClient, ValueDescriptorRestClient};
pub use corelink_core::{
    ClientError, Endpoint, EndpointParams, Monitor, RequestContext, CLIENT_MONITOR_DEFAULT,
};
pub use discovery::{ConsulMonitor, Discovery, StaticDiscovery, StaticMonitor};

/// Percent-encode one URL path segment (everything but RFC 3986 unreserved characters).
pub(crate) fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
