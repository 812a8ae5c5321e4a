//! Load endpoint parameters: JSON file, then env overlay.

use std::path::Path;

use corelink_core::EndpointParams;
use thiserror::Error;

use crate::discovery::Discovery;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid endpoint params: {0}")]
    Json(#[from] serde_json::Error),
    #[error("registry mode for {service_key:?} needs a registry: pass --consul or set {env_prefix}_CONSUL_URL")]
    NoRegistry {
        service_key: String,
        env_prefix: String,
    },
}

/// Read `EndpointParams` from a JSON file, e.g.
/// `{"serviceKey": "edgex-core-data", "path": "/api/v1/valuedescriptor", "useRegistry": true, "interval": 15000}`.
/// Then apply `{env_prefix}_URL` / `_USE_REGISTRY` / `_INTERVAL_MS` if set.
pub fn load_params(path: &Path, env_prefix: &str) -> Result<EndpointParams, ConfigError> {
    let raw = std::fs::read(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let params: EndpointParams = serde_json::from_slice(&raw)?;
    Ok(params.apply_env(env_prefix))
}

/// Consul agent URL from `{env_prefix}_CONSUL_URL`, if set and not blank.
pub fn consul_url_from_env(env_prefix: &str) -> Option<String> {
    std::env::var(format!("{}_CONSUL_URL", env_prefix))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Choose the registry for `params`. A Consul URL turns registry mode on;
/// registry mode without one is an error instead of a watcher that never resolves.
pub fn select_discovery(
    params: &mut EndpointParams,
    consul_url: Option<&str>,
    env_prefix: &str,
) -> Result<Discovery, ConfigError> {
    match consul_url {
        Some(consul_url) => {
            params.use_registry = true;
            Ok(Discovery::new().consul(consul_url))
        }
        None if params.use_registry => Err(ConfigError::NoRegistry {
            service_key: params.service_key.clone(),
            env_prefix: env_prefix.to_string(),
        }),
        None => Ok(Discovery::new()),
    }
}
