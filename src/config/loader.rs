//! Configuration loading from disk and the command line.

use std::fs;
use std::path::Path;

use crate::config::schema::CollectorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Values set on the command line or through the environment.
///
/// `None` leaves the file (or default) value in place.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub http_port: Option<u16>,
    pub zipkin_http_port: Option<u16>,
    pub health_check_http_port: Option<u16>,
    pub storage_type: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub metrics_port: Option<u16>,
    pub await_http_bind: Option<bool>,
}

impl Overrides {
    /// Apply every set value onto `config`.
    pub fn apply(&self, config: &mut CollectorConfig) {
        let opts = &mut config.collector;
        if let Some(host) = &self.host {
            opts.host = host.clone();
        }
        if let Some(port) = self.port {
            opts.port = port;
        }
        if let Some(port) = self.http_port {
            opts.http_port = port;
        }
        if let Some(port) = self.zipkin_http_port {
            opts.zipkin_http_port = port;
        }
        if let Some(port) = self.health_check_http_port {
            opts.health_check_http_port = port;
        }
        if let Some(storage_type) = &self.storage_type {
            config.span_storage.storage_type = storage_type.clone();
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.observability.log_format = format.clone();
        }
        if let Some(port) = self.metrics_port {
            config.observability.metrics_port = port;
        }
        if let Some(wait) = self.await_http_bind {
            config.health.await_http_bind = wait;
        }
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<CollectorConfig, ConfigError> {
    resolve_config(Some(path), &Overrides::default())
}

/// Merge defaults, an optional TOML file and overrides, then validate.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: &Overrides,
) -> Result<CollectorConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => CollectorConfig::default(),
    };

    overrides.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn overrides_win_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[collector]\nport = 15000\nzipkin_http_port = 9411\n\n[observability]\nlog_format = \"json\""
        )
        .unwrap();

        let overrides = Overrides {
            port: Some(16000),
            ..Default::default()
        };
        let config = resolve_config(Some(file.path()), &overrides).unwrap();

        assert_eq!(config.collector.port, 16000);
        assert_eq!(config.collector.zipkin_http_port, 9411);
        assert_eq!(config.observability.log_format, "json");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/collector.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[collector\nport = ").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn overrides_are_validated() {
        let overrides = Overrides {
            http_port: Some(0),
            ..Default::default()
        };
        let err = resolve_config(None, &overrides).unwrap_err();
        assert!(err.to_string().contains("collector.http_port must not be 0"));
    }
}
