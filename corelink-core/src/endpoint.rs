//! Endpoint parameters and the shared "current URL" of a client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Default interval between registry lookups.
pub const CLIENT_MONITOR_DEFAULT: Duration = Duration::from_millis(15_000);

/// Where a client sends its requests: a static URL, or a service key resolved through a registry.
/// Copied into every component that needs it; never shared mutably.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointParams {
    /// Registry name of the target service (e.g. "edgex-core-data").
    pub service_key: String,
    /// Route appended to the resolved base URL.
    pub path: String,
    #[serde(default)]
    pub use_registry: bool,
    /// Static URL. In registry mode it only seeds the endpoint until the first resolution.
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_interval", with = "millis")]
    pub interval: Duration,
}

fn default_interval() -> Duration {
    CLIENT_MONITOR_DEFAULT
}

impl EndpointParams {
    /// Static endpoint with the default monitor interval.
    pub fn new(service_key: &str, path: &str, url: &str) -> Self {
        Self {
            service_key: service_key.to_string(),
            path: path.to_string(),
            use_registry: false,
            url: url.to_string(),
            interval: CLIENT_MONITOR_DEFAULT,
        }
    }

    pub fn use_registry(mut self, use_registry: bool) -> Self {
        self.use_registry = use_registry;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Overlay values from env: `{PREFIX}_URL`, `{PREFIX}_USE_REGISTRY`, `{PREFIX}_INTERVAL_MS`.
    /// Unset or unparsable variables keep the current value.
    pub fn apply_env(mut self, prefix: &str) -> Self {
        if let Ok(url) = std::env::var(format!("{}_URL", prefix)) {
            self.url = url;
        }
        if let Some(flag) = std::env::var(format!("{}_USE_REGISTRY", prefix))
            .ok()
            .and_then(|s| parse_flag(&s))
        {
            self.use_registry = flag;
        }
        if let Some(ms) = std::env::var(format!("{}_INTERVAL_MS", prefix))
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
        {
            self.interval = Duration::from_millis(ms);
        }
        self
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Current URL of a client. Written by the endpoint watcher, read by every request.
/// Cheap to clone; all clones observe the same value.
#[derive(Clone, Debug)]
pub struct Endpoint {
    tx: std::sync::Arc<watch::Sender<Current>>,
}

#[derive(Clone, Debug, Default)]
struct Current {
    url: String,
    resolved: bool,
}

impl Endpoint {
    /// Fixed endpoint (registry disabled). Counts as resolved.
    pub fn fixed(url: &str) -> Self {
        Self::with_state(url, true)
    }

    /// Endpoint waiting for its first resolution, seeded with `url` (may be empty).
    pub fn seeded(url: &str) -> Self {
        Self::with_state(url, false)
    }

    fn with_state(url: &str, resolved: bool) -> Self {
        let (tx, _) = watch::channel(Current {
            url: url.to_string(),
            resolved,
        });
        Self {
            tx: std::sync::Arc::new(tx),
        }
    }

    /// Latest published URL. Empty only while awaiting the first resolution without a seed.
    pub fn url(&self) -> String {
        self.tx.borrow().url.clone()
    }

    /// True once a URL was resolved (always true for fixed endpoints).
    pub fn is_resolved(&self) -> bool {
        self.tx.borrow().resolved
    }

    /// Publish a resolved URL. Empty values are ignored; returns whether the URL changed.
    pub fn publish(&self, url: &str) -> bool {
        if url.is_empty() {
            return false;
        }
        self.tx.send_if_modified(|current| {
            let changed = current.url != url;
            if changed {
                current.url = url.to_string();
            }
            let first = !current.resolved;
            current.resolved = true;
            changed || first
        })
    }

    /// Wait until a URL was resolved and return it.
    pub async fn wait_resolved(&self) -> String {
        let mut rx = self.tx.subscribe();
        // The sender lives in self, so the channel cannot close while we wait.
        let url = match rx.wait_for(|current| current.resolved).await {
            Ok(current) => current.url.clone(),
            Err(_) => self.url(),
        };
        url
    }
}
