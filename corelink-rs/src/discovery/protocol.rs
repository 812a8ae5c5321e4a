//! Registry kept in memory: service key -> base URLs, for fixed deployments and tests.

use std::collections::HashMap;

use corelink_core::ServiceDiscovery;

/// Fixed registry. A key may map to several base URLs; the first registered is preferred.
#[derive(Clone, Debug, Default)]
pub struct StaticDiscovery {
    services: HashMap<String, Vec<String>>,
}

impl StaticDiscovery {
    /// One base URL per service key.
    pub fn new(services: HashMap<String, String>) -> Self {
        Self {
            services: services
                .into_iter()
                .map(|(key, base)| (key, vec![base]))
                .collect(),
        }
    }

    /// From (service key, base url) pairs. Repeated keys add fallbacks in slice order.
    pub fn from_slice(pairs: &[(&str, &str)]) -> Self {
        let mut services: HashMap<String, Vec<String>> = HashMap::new();
        for (key, base) in pairs {
            services
                .entry((*key).to_string())
                .or_default()
                .push((*base).to_string());
        }
        Self { services }
    }
}

impl ServiceDiscovery for StaticDiscovery {
    fn resolve(&self, service_key: &str) -> Vec<String> {
        self.services.get(service_key).cloned().unwrap_or_default()
    }
}
