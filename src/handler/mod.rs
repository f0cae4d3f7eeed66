//! Span handling subsystem.
//!
//! # Data Flow
//! ```text
//! RPC call / HTTP request
//!     → model.rs (native Batch or ZipkinSpan)
//!     → processor.rs (normalise to StoredSpan, drop invalid spans)
//!     → writer.rs (memory or log storage)
//! ```
//!
//! # Design Decisions
//! - Both formats share one processor so storage sees a single span shape
//! - Handlers are synchronous; front-ends call them from their own tasks
//! - The builder is a trait so startup can be driven with any handler set

pub mod builder;
pub mod model;
pub mod processor;
pub mod writer;

pub use builder::{BuildError, HandlerBuilder, HandlerSet, SpanHandlerBuilder};
pub use model::{
    Batch, Endpoint, Process, Span, SpanFormat, StoredSpan, SubmitResponse, Tag, ZipkinSpan,
};
pub use processor::{BatchesHandler, HandlerError, SpanProcessor, ZipkinSpansHandler};
pub use writer::{LogWriter, MemoryWriter, SpanWriter, WriterError};
