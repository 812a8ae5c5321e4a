//! Discovery: registry monitors and a builder choosing one of them.

mod consul;
mod protocol;

pub use consul::ConsulMonitor;
pub use protocol::StaticDiscovery;

use std::collections::HashMap;
use std::sync::Arc;

use corelink_core::{DiscoveryMonitor, Monitor};

/// Monitor over a static map; the canned registry used for fixed deployments and tests.
pub type StaticMonitor = DiscoveryMonitor<StaticDiscovery>;

/// Picks the monitor a client resolves its endpoint with: static map, Consul, or custom.
pub struct Discovery {
    monitor: Option<Arc<dyn Monitor>>,
}

impl Discovery {
    pub fn new() -> Self {
        Self { monitor: None }
    }

    /// Static config: service key -> base URL.
    pub fn static_discovery(mut self, services: HashMap<String, String>) -> Self {
        self.monitor = Some(Arc::new(StaticMonitor::new(StaticDiscovery::new(services))));
        self
    }

    /// Static discovery from (service key, base url) pairs; repeated keys are fallbacks.
    pub fn static_slice(mut self, pairs: &[(&str, &str)]) -> Self {
        self.monitor = Some(Arc::new(StaticMonitor::new(StaticDiscovery::from_slice(
            pairs,
        ))));
        self
    }

    /// Consul agent at `consul_url`.
    pub fn consul(mut self, consul_url: &str) -> Self {
        self.monitor = Some(Arc::new(ConsulMonitor::new(consul_url)));
        self
    }

    /// Use custom implementation.
    pub fn adapter(mut self, monitor: impl Monitor + 'static) -> Self {
        self.monitor = Some(Arc::new(monitor));
        self
    }

    /// The chosen monitor; an empty static map if none was chosen.
    pub fn build(self) -> Arc<dyn Monitor> {
        self.monitor.unwrap_or_else(|| {
            Arc::new(StaticMonitor::new(StaticDiscovery::default())) as Arc<dyn Monitor>
        })
    }
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new()
    }
}
