//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the collector.
//! All types derive Serde traits for deserialization from config files.

use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

/// Root configuration for the collector.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct CollectorConfig {
    /// Listener ports for every front-end.
    pub collector: CollectorOptions,

    /// Span storage selection.
    pub span_storage: SpanStorageConfig,

    /// Health endpoint behaviour.
    pub health: HealthConfig,

    /// Settings shared by the HTTP front-ends.
    pub http: HttpConfig,

    /// RPC transport settings.
    pub transport: TransportConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Ports and bind host of the collector front-ends.
///
/// A port of zero disables the front-end. Only the zipkin front-end may be
/// disabled; validation rejects zero for the others.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CollectorOptions {
    /// Address every listener binds on (e.g., "0.0.0.0").
    pub host: String,

    /// RPC transport port.
    pub port: u16,

    /// Primary HTTP ingestion API port.
    pub http_port: u16,

    /// Zipkin-compatible HTTP API port (0 = disabled).
    pub zipkin_http_port: u16,

    /// Health check endpoint port.
    pub health_check_http_port: u16,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 14267,
            http_port: 14268,
            zipkin_http_port: 0,
            health_check_http_port: 14269,
        }
    }
}

impl CollectorOptions {
    /// Socket address for `port` on the configured host.
    ///
    /// Falls back to the unspecified address when the host does not parse;
    /// validation reports that case before startup.
    pub fn socket_addr(&self, port: u16) -> SocketAddr {
        let ip = self
            .host
            .parse::<IpAddr>()
            .unwrap_or(IpAddr::from([0, 0, 0, 0]));
        SocketAddr::new(ip, port)
    }

    pub fn rpc_addr(&self) -> SocketAddr {
        self.socket_addr(self.port)
    }

    pub fn http_addr(&self) -> SocketAddr {
        self.socket_addr(self.http_port)
    }

    pub fn health_addr(&self) -> SocketAddr {
        self.socket_addr(self.health_check_http_port)
    }

    /// Zipkin front-end address, `None` when the front-end is disabled.
    pub fn zipkin_addr(&self) -> Option<SocketAddr> {
        (self.zipkin_http_port != 0).then(|| self.socket_addr(self.zipkin_http_port))
    }
}

/// Span storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SpanStorageConfig {
    /// Storage backend: "memory" or "log".
    #[serde(rename = "type")]
    pub storage_type: String,
}

impl Default for SpanStorageConfig {
    fn default() -> Self {
        Self {
            storage_type: "memory".to_string(),
        }
    }
}

/// Health endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HealthConfig {
    /// HTTP status code served once the collector is ready.
    pub ready_status_code: u16,

    /// Wait for every HTTP front-end to bind before reporting ready.
    pub await_http_bind: bool,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            ready_status_code: 200,
            await_http_bind: false,
        }
    }
}

/// HTTP front-end configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,

    /// Log the backtrace of a recovered handler panic.
    pub recovery_print_stack: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10 * 1024 * 1024,
            recovery_print_stack: true,
        }
    }
}

/// RPC transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TransportConfig {
    /// Name the channel announces itself with.
    pub service_name: String,

    /// Maximum frame length in bytes.
    pub max_frame_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            service_name: "trace-collector".to_string(),
            max_frame_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Prometheus scrape port (0 = disabled).
    pub metrics_port: u16,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_port: 0,
        }
    }
}
