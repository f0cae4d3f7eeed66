//! Span storage writers.
//!
//! Storage backends live outside the collector; these writers are the seam
//! the handlers write through.

use std::sync::Mutex;

use thiserror::Error;

use crate::handler::model::StoredSpan;

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("span storage unavailable: {0}")]
    Unavailable(String),
}

/// Destination for accepted spans.
pub trait SpanWriter: Send + Sync {
    fn write_span(&self, span: &StoredSpan) -> Result<(), WriterError>;
}

/// Keeps every span in process memory.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    spans: Mutex<Vec<StoredSpan>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far.
    pub fn spans(&self) -> Vec<StoredSpan> {
        self.spans
            .lock()
            .map(|spans| spans.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.spans.lock().map(|spans| spans.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SpanWriter for MemoryWriter {
    fn write_span(&self, span: &StoredSpan) -> Result<(), WriterError> {
        self.spans
            .lock()
            .map_err(|_| WriterError::Unavailable("memory store poisoned".into()))?
            .push(span.clone());
        Ok(())
    }
}

/// Emits each span as a debug event.
#[derive(Debug, Default)]
pub struct LogWriter;

impl SpanWriter for LogWriter {
    fn write_span(&self, span: &StoredSpan) -> Result<(), WriterError> {
        tracing::debug!(
            format = span.format.as_str(),
            service = %span.service_name,
            trace_id = %span.trace_id,
            span_id = %span.span_id,
            operation = %span.operation_name,
            duration_us = span.duration,
            "Span received"
        );
        Ok(())
    }
}
