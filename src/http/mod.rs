//! HTTP front-end subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (frontend.rs binds)
//!     → request id, tracing, body limit (frontend.rs)
//!     → recovery.rs (panic → 500, listener unaffected)
//!     → api.rs or zipkin.rs route table
//!     → span handlers
//! ```

pub mod api;
pub mod frontend;
pub mod recovery;
pub mod zipkin;

pub use frontend::{build_app, FrontendError, FrontendRole, HttpFrontend};
pub use recovery::{Recovery, RecoveryLayer};
