//! Command line interface.
//!
//! Every flag is optional and falls back to an environment variable; unset
//! values leave the file or default configuration untouched.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::Overrides;

#[derive(Debug, Parser)]
#[command(name = "trace-collector")]
#[command(about = "Receives trace spans over RPC and HTTP", long_about = None)]
pub struct CollectorArgs {
    /// TOML configuration file
    #[arg(long, env = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Address every collector listener binds to
    #[arg(long = "collector.host", env = "COLLECTOR_HOST")]
    pub host: Option<String>,

    /// Port of the RPC transport
    #[arg(long = "collector.port", env = "COLLECTOR_PORT")]
    pub port: Option<u16>,

    /// Port of the primary HTTP API
    #[arg(long = "collector.http-port", env = "COLLECTOR_HTTP_PORT")]
    pub http_port: Option<u16>,

    /// Port of the zipkin HTTP API; 0 disables it
    #[arg(long = "collector.zipkin.http-port", env = "COLLECTOR_ZIPKIN_HTTP_PORT")]
    pub zipkin_http_port: Option<u16>,

    /// Port of the health check endpoint
    #[arg(
        long = "collector.health-check-http-port",
        env = "COLLECTOR_HEALTH_CHECK_HTTP_PORT"
    )]
    pub health_check_http_port: Option<u16>,

    /// Span storage backend (memory or log)
    #[arg(long = "span-storage.type", env = "SPAN_STORAGE_TYPE")]
    pub storage_type: Option<String>,

    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// pretty or json
    #[arg(long, env = "LOG_FORMAT")]
    pub log_format: Option<String>,

    /// Port of the Prometheus scrape endpoint; 0 disables it
    #[arg(long, env = "METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Report Ready only once every HTTP front-end is listening
    #[arg(long = "health.await-http-bind", env = "HEALTH_AWAIT_HTTP_BIND")]
    pub await_http_bind: Option<bool>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the collector version
    Version,
}

#[derive(Debug, Serialize)]
pub struct VersionInfo {
    pub name: &'static str,
    pub version: &'static str,
}

impl VersionInfo {
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

impl CollectorArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            http_port: self.http_port,
            zipkin_http_port: self.zipkin_http_port,
            health_check_http_port: self.health_check_http_port,
            storage_type: self.storage_type.clone(),
            log_level: self.log_level.clone(),
            log_format: self.log_format.clone(),
            metrics_port: self.metrics_port,
            await_http_bind: self.await_http_bind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollectorConfig;

    #[test]
    fn dotted_flags_override_config() {
        let args = CollectorArgs::try_parse_from([
            "trace-collector",
            "--collector.port",
            "24267",
            "--collector.zipkin.http-port",
            "9411",
            "--span-storage.type",
            "log",
            "--health.await-http-bind",
            "true",
        ])
        .unwrap();

        let mut config = CollectorConfig::default();
        args.overrides().apply(&mut config);

        assert_eq!(config.collector.port, 24267);
        assert_eq!(config.collector.zipkin_http_port, 9411);
        assert_eq!(config.collector.http_port, 14268);
        assert_eq!(config.span_storage.storage_type, "log");
        assert!(config.health.await_http_bind);
    }

    #[test]
    fn version_subcommand_parses() {
        let args = CollectorArgs::try_parse_from(["trace-collector", "version"]).unwrap();
        assert!(matches!(args.command, Some(Command::Version)));

        let json = serde_json::to_value(VersionInfo::current()).unwrap();
        assert_eq!(json["name"], "trace-collector");
    }

    #[test]
    fn bad_port_is_rejected() {
        let res = CollectorArgs::try_parse_from(["trace-collector", "--collector.port", "70000"]);
        assert!(res.is_err());
    }
}
