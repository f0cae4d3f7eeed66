//! RPC transport subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → channel.rs (accept loop, length-delimited frames)
//!     → server.rs (decode CallFrame, look up service by name)
//!     → services.rs (decode body, call span handler)
//!     → ReplyFrame back on the same connection
//! ```
//!
//! # Design Decisions
//! - Binding is awaited; the accept loop runs in its own task
//! - Several named services share one bound channel
//! - Every call gets a reply, errors included

pub mod channel;
pub mod client;
pub mod server;
pub mod services;
pub mod wire;

pub use channel::{Channel, TransportError};
pub use client::{ClientError, RpcClient};
pub use server::{RpcService, ServiceRegistry, TransportServer};
pub use services::{CollectorService, ZipkinCollectorService};
pub use wire::{CallFrame, ReplyFrame, RpcError, RpcErrorCode};
