//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestrator (startup done)      → HealthCheck::ready()
//! Orchestrator (primary API died)  → HealthCheck::set(Failed)
//!     → state.rs (monotonic transition check)
//!     → server.rs (status code for every probe)
//! ```
//!
//! # Design Decisions
//! - One owned handle passed to whoever reports status, no global
//! - Transitions only move forward; rejected changes are logged
//! - Any path on the health port answers, so probes need no route config

pub mod server;
pub mod state;

pub use server::{HealthCheck, HealthError};
pub use state::{HealthState, HealthStatus, TransitionError};
