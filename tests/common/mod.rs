//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use std::time::Duration;

use reqwest::StatusCode;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use trace_collector::handler::{BuildError, HandlerBuilder, HandlerSet, MemoryWriter};
use trace_collector::lifecycle::LifecycleEvent;
use trace_collector::{CollectorConfig, HealthCheck, SpanHandlerBuilder};

/// Loopback config using `base`, `base + 1` and `base + 2` for the RPC,
/// primary HTTP and health ports. The zipkin front-end is disabled.
pub fn config(base: u16) -> CollectorConfig {
    let mut config = CollectorConfig::default();
    config.collector.host = "127.0.0.1".into();
    config.collector.port = base;
    config.collector.http_port = base + 1;
    config.collector.health_check_http_port = base + 2;
    config.collector.zipkin_http_port = 0;
    config.http.recovery_print_stack = false;
    config
}

pub fn addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// HTTP client that bypasses proxies and never reuses connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .pool_max_idle_per_host(0)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Poll until something accepts connections on `port`.
pub async fn wait_for_port(port: u16) -> bool {
    for _ in 0..100 {
        if TcpStream::connect(addr(port)).await.is_ok() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

pub async fn is_listening(port: u16) -> bool {
    TcpStream::connect(addr(port)).await.is_ok()
}

/// Poll the health endpoint until it answers with `expected`.
pub async fn wait_for_health(client: &reqwest::Client, port: u16, expected: StatusCode) {
    let url = format!("http://127.0.0.1:{port}/");
    for _ in 0..100 {
        if let Ok(res) = client.get(&url).send().await {
            if res.status() == expected {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("health on port {port} never reported {expected}");
}

/// Drain every event published so far.
pub fn drain(events: &mut mpsc::UnboundedReceiver<LifecycleEvent>) -> Vec<LifecycleEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

pub fn health_from(events: &[LifecycleEvent]) -> Option<HealthCheck> {
    events.iter().find_map(|e| match e {
        LifecycleEvent::HealthServing(health) => Some(health.clone()),
        _ => None,
    })
}

/// Memory-backed builder that counts `build` calls.
pub struct CountingBuilder {
    inner: SpanHandlerBuilder,
    pub calls: Arc<AtomicUsize>,
    pub writer: Arc<MemoryWriter>,
}

impl CountingBuilder {
    pub fn new() -> Self {
        let writer = Arc::new(MemoryWriter::new());
        Self {
            inner: SpanHandlerBuilder::new(Default::default()).with_writer(writer.clone()),
            calls: Arc::new(AtomicUsize::new(0)),
            writer,
        }
    }
}

impl HandlerBuilder for CountingBuilder {
    fn build(&self) -> Result<HandlerSet, BuildError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.build()
    }
}

/// Builder that blocks until the test opens the gate, holding startup
/// between the health server and the transport. Needs a multi-thread runtime.
pub struct GatedBuilder {
    inner: SpanHandlerBuilder,
    gate: Mutex<std_mpsc::Receiver<()>>,
}

impl GatedBuilder {
    pub fn new() -> (Self, std_mpsc::Sender<()>) {
        let (tx, rx) = std_mpsc::channel();
        let builder = Self {
            inner: SpanHandlerBuilder::new(Default::default()),
            gate: Mutex::new(rx),
        };
        (builder, tx)
    }
}

impl HandlerBuilder for GatedBuilder {
    fn build(&self) -> Result<HandlerSet, BuildError> {
        // Hand the worker to other tasks so the health server keeps serving.
        tokio::task::block_in_place(|| {
            let _ = self.gate.lock().unwrap().recv();
        });
        self.inner.build()
    }
}
