//! Service discovery trait: resolve(service_key) -> base URLs. Backs the registry monitors.

/// How to resolve services by key. Implementations: static map, registry snapshot, etc.
pub trait ServiceDiscovery: Send + Sync {
    /// Base URLs (scheme://host:port) for the service, most preferred first. Empty if unknown.
    fn resolve(&self, service_key: &str) -> Vec<String>;
}
