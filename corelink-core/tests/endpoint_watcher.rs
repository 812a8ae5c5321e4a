//! Endpoint watcher: static vs registry mode, failed cycles, stop.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use corelink_core::{
    DiscoveryMonitor, Endpoint, EndpointParams, EndpointWatcher, Monitor, ServiceDiscovery,
};
use tokio::sync::mpsc;

const ROUTE: &str = "/api/v1/valuedescriptor";

/// Knows only "core-data", at localhost:48080.
struct MockEndpoint;

#[async_trait]
impl Monitor for MockEndpoint {
    async fn monitor(&self, params: &EndpointParams, tx: mpsc::Sender<String>) {
        let url = match params.service_key.as_str() {
            "core-data" => format!("http://{}:{}{}", "localhost", 48080, params.path),
            _ => String::new(),
        };
        let _ = tx.send(url).await;
    }
}

/// Delivers the scripted values in order, then empty strings.
struct Scripted {
    values: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(values: &[&str]) -> Self {
        Self {
            values: Mutex::new(values.iter().rev().map(|s| s.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Monitor for Scripted {
    async fn monitor(&self, _params: &EndpointParams, tx: mpsc::Sender<String>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.values.lock().unwrap().pop().unwrap_or_default();
        let _ = tx.send(next).await;
    }
}

/// Drops the channel without sending.
struct Silent;

#[async_trait]
impl Monitor for Silent {
    async fn monitor(&self, _params: &EndpointParams, _tx: mpsc::Sender<String>) {}
}

/// Never delivers. Records when a lookup starts and when it is dropped unfinished.
#[derive(Default)]
struct Hung {
    started: AtomicUsize,
    dropped: Arc<AtomicBool>,
}

struct SetOnDrop(Arc<AtomicBool>);

impl Drop for SetOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Monitor for Hung {
    async fn monitor(&self, _params: &EndpointParams, _tx: mpsc::Sender<String>) {
        self.started.fetch_add(1, Ordering::SeqCst);
        let _guard = SetOnDrop(Arc::clone(&self.dropped));
        std::future::pending::<()>().await;
    }
}

fn registry_params(service_key: &str, seed: &str) -> EndpointParams {
    EndpointParams::new(service_key, ROUTE, seed)
        .use_registry(true)
        .interval(Duration::from_millis(10))
}

#[tokio::test(start_paused = true)]
async fn fixed_endpoint_never_changes() {
    let url = "http://127.0.0.1:9000/api/v1/valuedescriptor";
    let endpoint = Endpoint::fixed(url);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(endpoint.url(), url);
    assert!(endpoint.is_resolved());
}

#[tokio::test(start_paused = true)]
async fn registry_url_is_resolved_after_one_interval() {
    let params = registry_params("core-data", "");
    let endpoint = Endpoint::seeded(&params.url);
    assert_eq!(endpoint.url(), "");
    assert!(!endpoint.is_resolved());

    let _handle = EndpointWatcher::spawn(params, Arc::new(MockEndpoint), endpoint.clone());
    tokio::time::sleep(Duration::from_millis(25)).await;

    assert_eq!(endpoint.url(), "http://localhost:48080/api/v1/valuedescriptor");
    assert!(endpoint.is_resolved());
}

#[tokio::test(start_paused = true)]
async fn unknown_service_keeps_seed() {
    let seed = "http://10.0.0.1:48080/api/v1/valuedescriptor";
    let params = registry_params("unknown-service", seed);
    let endpoint = Endpoint::seeded(&params.url);

    let _handle = EndpointWatcher::spawn(params, Arc::new(MockEndpoint), endpoint.clone());
    tokio::time::sleep(Duration::from_millis(25)).await;

    assert_eq!(endpoint.url(), seed);
    assert!(!endpoint.is_resolved());
}

#[tokio::test(start_paused = true)]
async fn empty_delivery_keeps_last_good_url() {
    let monitor = Arc::new(Scripted::new(&["http://a:1/x", "", "", "http://b:2/x"]));
    let endpoint = Endpoint::seeded("");
    let _handle = EndpointWatcher::spawn(
        registry_params("core-data", ""),
        monitor.clone(),
        endpoint.clone(),
    );

    // First cycle runs immediately.
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(endpoint.url(), "http://a:1/x");

    // Two empty cycles.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(monitor.calls.load(Ordering::SeqCst), 3);
    assert_eq!(endpoint.url(), "http://a:1/x");

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(endpoint.url(), "http://b:2/x");
}

#[tokio::test(start_paused = true)]
async fn dropped_sender_counts_as_failure() {
    let seed = "http://seed:1/x";
    let endpoint = Endpoint::seeded(seed);
    let _handle = EndpointWatcher::spawn(
        registry_params("core-data", seed),
        Arc::new(Silent),
        endpoint.clone(),
    );
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(endpoint.url(), seed);
}

#[tokio::test(start_paused = true)]
async fn stopped_watcher_stops_polling() {
    let monitor = Arc::new(Scripted::new(&["http://a:1/x"]));
    let endpoint = Endpoint::seeded("");
    let handle = EndpointWatcher::spawn(
        registry_params("core-data", ""),
        monitor.clone(),
        endpoint.clone(),
    );
    tokio::time::sleep(Duration::from_millis(25)).await;
    let calls = monitor.calls.load(Ordering::SeqCst);
    assert!(calls >= 2);

    handle.stop();
    assert!(handle.is_stopped());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(monitor.calls.load(Ordering::SeqCst), calls);
    assert_eq!(endpoint.url(), "http://a:1/x");
}

#[tokio::test(start_paused = true)]
async fn zero_interval_is_clamped() {
    let monitor = Arc::new(Scripted::new(&["http://a:1/x"]));
    let endpoint = Endpoint::seeded("");
    let _handle = EndpointWatcher::spawn(
        registry_params("core-data", "").interval(Duration::ZERO),
        monitor.clone(),
        endpoint.clone(),
    );
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(endpoint.url(), "http://a:1/x");
    // One cycle per millisecond, not a busy loop.
    let calls = monitor.calls.load(Ordering::SeqCst);
    assert!((2..=7).contains(&calls), "calls = {}", calls);
}

#[tokio::test(start_paused = true)]
async fn stop_interrupts_pending_cycle() {
    let monitor = Arc::new(Hung::default());
    let seed = "http://seed:1/x";
    let endpoint = Endpoint::seeded(seed);
    let handle = EndpointWatcher::spawn(
        registry_params("core-data", seed),
        monitor.clone(),
        endpoint.clone(),
    );
    tokio::time::sleep(Duration::from_millis(25)).await;
    // Still stuck in the first cycle.
    assert_eq!(monitor.started.load(Ordering::SeqCst), 1);
    assert!(!monitor.dropped.load(Ordering::SeqCst));

    handle.stop();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(monitor.dropped.load(Ordering::SeqCst));
    assert_eq!(monitor.started.load(Ordering::SeqCst), 1);
    assert_eq!(endpoint.url(), seed);
}

#[tokio::test(start_paused = true)]
async fn dropping_handle_stops_polling() {
    let monitor = Arc::new(Scripted::new(&[]));
    let handle = EndpointWatcher::spawn(
        registry_params("core-data", ""),
        monitor.clone(),
        Endpoint::seeded(""),
    );
    tokio::time::sleep(Duration::from_millis(5)).await;
    drop(handle);
    let calls = monitor.calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(monitor.calls.load(Ordering::SeqCst), calls);
}

#[tokio::test(start_paused = true)]
async fn wait_resolved_returns_first_resolution() {
    let endpoint = Endpoint::seeded("");
    let _handle = EndpointWatcher::spawn(
        registry_params("core-data", ""),
        Arc::new(MockEndpoint),
        endpoint.clone(),
    );
    let url = tokio::time::timeout(Duration::from_secs(1), endpoint.wait_resolved())
        .await
        .unwrap();
    assert_eq!(url, "http://localhost:48080/api/v1/valuedescriptor");
}

struct OneService;

impl ServiceDiscovery for OneService {
    fn resolve(&self, service_key: &str) -> Vec<String> {
        if service_key == "core-data" {
            vec!["http://localhost:48080/".into(), "http://backup:48080".into()]
        } else {
            Vec::new()
        }
    }
}

#[tokio::test]
async fn discovery_monitor_composes_first_url() {
    let monitor = DiscoveryMonitor::new(OneService);

    let (tx, mut rx) = mpsc::channel(1);
    monitor.monitor(&registry_params("core-data", ""), tx).await;
    assert_eq!(
        rx.recv().await.unwrap(),
        "http://localhost:48080/api/v1/valuedescriptor"
    );

    let (tx, mut rx) = mpsc::channel(1);
    monitor.monitor(&registry_params("other", ""), tx).await;
    assert_eq!(rx.recv().await.unwrap(), "");

    let (tx, mut rx) = mpsc::channel(1);
    monitor
        .monitor(&EndpointParams::new("core-data", "", "").use_registry(true), tx)
        .await;
    assert_eq!(rx.recv().await.unwrap(), "");
}
