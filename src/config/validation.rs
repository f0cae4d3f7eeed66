//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports, status codes, size limits)
//! - Detect port collisions between front-ends
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CollectorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Storage type and service name are checked by the components that use
//!   them, so their failures surface as startup errors

use std::net::IpAddr;

use thiserror::Error;

use crate::config::schema::CollectorConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be 0")]
    ZeroPort { field: &'static str },

    #[error("{first} and {second} share port {port}")]
    PortConflict {
        first: &'static str,
        second: &'static str,
        port: u16,
    },

    #[error("collector.host {0:?} is not an IP address")]
    InvalidHost(String),

    #[error("health.ready_status_code {0} is not a 2xx code")]
    InvalidReadyStatus(u16),

    #[error("observability.log_format {0:?} is not one of pretty, json")]
    InvalidLogFormat(String),

    #[error("{0} must be greater than 0")]
    ZeroLimit(&'static str),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &CollectorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let opts = &config.collector;

    let required = [
        ("collector.port", opts.port),
        ("collector.http_port", opts.http_port),
        ("collector.health_check_http_port", opts.health_check_http_port),
    ];
    for (field, port) in required {
        if port == 0 {
            errors.push(ValidationError::ZeroPort { field });
        }
    }

    let mut ports: Vec<(&'static str, u16)> = required.to_vec();
    ports.push(("collector.zipkin_http_port", opts.zipkin_http_port));
    ports.push(("observability.metrics_port", config.observability.metrics_port));
    for (i, &(first, a)) in ports.iter().enumerate() {
        for &(second, b) in &ports[i + 1..] {
            if a != 0 && a == b {
                errors.push(ValidationError::PortConflict {
                    first,
                    second,
                    port: a,
                });
            }
        }
    }

    if opts.host.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidHost(opts.host.clone()));
    }

    if !(200..=299).contains(&config.health.ready_status_code) {
        errors.push(ValidationError::InvalidReadyStatus(
            config.health.ready_status_code,
        ));
    }

    let format = config.observability.log_format.as_str();
    if format != "pretty" && format != "json" {
        errors.push(ValidationError::InvalidLogFormat(format.to_string()));
    }

    if config.http.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroLimit("http.max_body_bytes"));
    }
    if config.transport.max_frame_bytes == 0 {
        errors.push(ValidationError::ZeroLimit("transport.max_frame_bytes"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&CollectorConfig::default()), Ok(()));
    }

    #[test]
    fn zipkin_port_zero_is_allowed() {
        let mut config = CollectorConfig::default();
        config.collector.zipkin_http_port = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn reports_every_error() {
        let mut config = CollectorConfig::default();
        config.collector.port = 0;
        config.collector.host = "localhost:80".into();
        config.health.ready_status_code = 503;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::ZeroPort {
            field: "collector.port"
        }));
        assert!(errors.contains(&ValidationError::InvalidReadyStatus(503)));
    }

    #[test]
    fn detects_shared_ports() {
        let mut config = CollectorConfig::default();
        config.collector.zipkin_http_port = config.collector.http_port;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::PortConflict {
                first: "collector.http_port",
                second: "collector.zipkin_http_port",
                port: 14268,
            }]
        );
    }
}
