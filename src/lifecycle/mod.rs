//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → resolve the shutdown future once
//!
//! Startup (startup.rs):
//!     Health → Handlers → RPC channel → Services → HTTP front-ends → Ready
//!
//! Termination (startup.rs):
//!     Signal        → Ok, process exits 0
//!     Front-end dies → exit policy → Err, process exits non-zero
//! ```
//!
//! # Design Decisions
//! - No graceful drain: listeners close with the process
//! - Exactly one place decides how the process ends

pub mod signals;
pub mod startup;

pub use signals::{ServiceHandle, Signal};
pub use startup::{
    handle_listener_exit, CollectorError, LifecycleEvent, ListenerExit, ServiceOrchestrator,
};
