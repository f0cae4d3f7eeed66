//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → optional TOML file (loader.rs)
//!     → command line / environment overrides (loader.rs, cli.rs)
//!     → validation.rs (semantic checks)
//!     → CollectorConfig (validated, immutable)
//!     → shared by reference with every component
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_config, ConfigError, Overrides};
pub use schema::{
    CollectorConfig, CollectorOptions, HealthConfig, HttpConfig, ObservabilityConfig,
    SpanStorageConfig, TransportConfig,
};
pub use validation::{validate_config, ValidationError};
