//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Configured host:port
//!     → listener.rs (bind, ListenerBinding)
//!     → connection.rs (connection ids, live connection count)
//!     → Hand off to the RPC transport or an HTTP front-end
//! ```
//!
//! # Design Decisions
//! - Each listener is owned by exactly one component
//! - Bindings are never torn down explicitly; process exit closes them

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{bind_listener, BindError, ListenerBinding, ListenerKind};
