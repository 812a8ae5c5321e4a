//! Endpoint watcher: periodically asks a [`Monitor`] for the service URL and publishes it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::endpoint::{Endpoint, EndpointParams};
use crate::monitor::Monitor;

/// Lower bound for the poll interval; tokio intervals cannot be zero.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub struct EndpointWatcher;

impl EndpointWatcher {
    /// Start the resolution loop on the current tokio runtime.
    /// The first cycle runs immediately, then one cycle per `params.interval`.
    /// The loop stops when the returned handle is stopped or dropped.
    pub fn spawn(
        params: EndpointParams,
        monitor: Arc<dyn Monitor>,
        endpoint: Endpoint,
    ) -> WatcherHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(params.interval.max(MIN_INTERVAL));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let url = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    url = resolve_once(&params, monitor.as_ref()) => url,
                };
                match url {
                    Some(url) if !url.is_empty() => {
                        if endpoint.publish(&url) {
                            tracing::debug!(service = %params.service_key, %url, "endpoint updated");
                        }
                    }
                    _ => {
                        tracing::debug!(service = %params.service_key, "resolution failed, keeping last url");
                    }
                }
            }
            tracing::debug!(service = %params.service_key, "endpoint watcher stopped");
        });
        WatcherHandle { cancel }
    }
}

/// One resolution cycle: invoke the monitor and read exactly one delivery.
/// `None` if the monitor returned without sending. The monitor runs inside this
/// future, so dropping the cycle also drops an unfinished lookup.
async fn resolve_once(params: &EndpointParams, monitor: &dyn Monitor) -> Option<String> {
    let (tx, mut rx) = mpsc::channel(1);
    tokio::select! {
        biased;
        url = rx.recv() => url,
        _ = monitor.monitor(params, tx) => rx.try_recv().ok(),
    }
}

/// Stops the watcher loop when stopped explicitly or dropped.
#[derive(Debug)]
pub struct WatcherHandle {
    cancel: CancellationToken,
}

impl WatcherHandle {
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
