//! Trace collector.
//!
//! Receives spans over one RPC transport and up to two HTTP APIs, and reports
//! readiness on a dedicated health port.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │                 COLLECTOR                    │
//!   RPC clients ──────┼─▶ transport (Collector, ZipkinCollector) ─┐  │
//!                     │                                           │  │
//!   HTTP /api/traces ─┼─▶ http primary front-end ─────────────────┼─▶│ handler ─▶ storage
//!                     │                                           │  │
//!   HTTP /api/v1/spans┼─▶ http zipkin front-end (optional) ───────┘  │
//!                     │                                              │
//!   probes ───────────┼─▶ health (503 → 200, 500 on failure)         │
//!                     │                                              │
//!                     │  lifecycle: ordered startup, signal wait,    │
//!                     │  front-end exit policy                       │
//!                     └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::process::ExitCode;

use clap::Parser;

use trace_collector::cli::{CollectorArgs, Command, VersionInfo};
use trace_collector::config::resolve_config;
use trace_collector::observability::{init_logging, metrics};
use trace_collector::{ServiceHandle, ServiceOrchestrator, SpanHandlerBuilder};

#[tokio::main]
async fn main() -> ExitCode {
    let args = CollectorArgs::parse();

    if let Some(Command::Version) = args.command {
        return match serde_json::to_string(&VersionInfo::current()) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("failed to encode version: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let config = match resolve_config(args.config.as_deref(), &args.overrides()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        rpc_port = config.collector.port,
        http_port = config.collector.http_port,
        zipkin_http_port = config.collector.zipkin_http_port,
        health_port = config.collector.health_check_http_port,
        storage = %config.span_storage.storage_type,
        "Configuration loaded"
    );

    let signals = match ServiceHandle::install() {
        Ok(signals) => signals,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install signal handlers");
            return ExitCode::FAILURE;
        }
    };

    if config.observability.metrics_port != 0 {
        let addr = SocketAddr::new(
            config.collector.rpc_addr().ip(),
            config.observability.metrics_port,
        );
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(error = %e, "Failed to start metrics endpoint");
        }
    }

    let builder = SpanHandlerBuilder::new(config.span_storage.clone());
    match ServiceOrchestrator::new(config, builder).run(signals).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Collector failed");
            ExitCode::FAILURE
        }
    }
}
