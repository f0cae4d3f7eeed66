//! Trace collector library.

pub mod cli;
pub mod config;
pub mod handler;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod transport;

pub use config::schema::CollectorConfig;
pub use handler::{HandlerBuilder, SpanHandlerBuilder};
pub use health::{HealthCheck, HealthStatus};
pub use lifecycle::{CollectorError, ServiceHandle, ServiceOrchestrator, Signal};
