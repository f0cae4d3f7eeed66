//! Handler set construction.

use std::sync::Arc;

use thiserror::Error;

use crate::config::SpanStorageConfig;
use crate::handler::processor::{BatchesHandler, SpanProcessor, ZipkinSpansHandler};
use crate::handler::writer::{LogWriter, MemoryWriter, SpanWriter};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("unsupported span storage type {0:?} (expected memory or log)")]
    UnsupportedStorage(String),
}

/// The pair of request handlers every front-end shares.
#[derive(Clone)]
pub struct HandlerSet {
    pub batches: Arc<dyn BatchesHandler>,
    pub zipkin: Arc<dyn ZipkinSpansHandler>,
}

/// Builds the handler set during startup.
pub trait HandlerBuilder {
    fn build(&self) -> Result<HandlerSet, BuildError>;
}

/// Builds span handlers backed by the configured storage.
pub struct SpanHandlerBuilder {
    storage: SpanStorageConfig,
    writer: Option<Arc<dyn SpanWriter>>,
}

impl SpanHandlerBuilder {
    pub fn new(storage: SpanStorageConfig) -> Self {
        Self {
            storage,
            writer: None,
        }
    }

    /// Use `writer` instead of the one the storage type selects.
    pub fn with_writer(mut self, writer: Arc<dyn SpanWriter>) -> Self {
        self.writer = Some(writer);
        self
    }

    fn writer(&self) -> Result<Arc<dyn SpanWriter>, BuildError> {
        if let Some(writer) = &self.writer {
            return Ok(writer.clone());
        }
        match self.storage.storage_type.as_str() {
            "memory" => Ok(Arc::new(MemoryWriter::new())),
            "log" => Ok(Arc::new(LogWriter)),
            other => Err(BuildError::UnsupportedStorage(other.to_string())),
        }
    }
}

impl HandlerBuilder for SpanHandlerBuilder {
    fn build(&self) -> Result<HandlerSet, BuildError> {
        let writer = self.writer()?;
        let processor = Arc::new(SpanProcessor::new(writer));

        tracing::info!(
            storage = %self.storage.storage_type,
            custom_writer = self.writer.is_some(),
            "Span handlers built"
        );

        Ok(HandlerSet {
            batches: processor.clone(),
            zipkin: processor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(kind: &str) -> SpanStorageConfig {
        SpanStorageConfig {
            storage_type: kind.into(),
        }
    }

    #[test]
    fn known_storage_types_build() {
        for kind in ["memory", "log"] {
            assert!(SpanHandlerBuilder::new(storage(kind)).build().is_ok());
        }
    }

    #[test]
    fn unknown_storage_type_fails() {
        let err = SpanHandlerBuilder::new(storage("cassandra"))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, BuildError::UnsupportedStorage(ref t) if t == "cassandra"));
    }

    #[test]
    fn injected_writer_overrides_storage_type() {
        let writer = Arc::new(MemoryWriter::new());
        let handlers = SpanHandlerBuilder::new(storage("cassandra"))
            .with_writer(writer.clone())
            .build()
            .unwrap();

        handlers.batches.submit_batches(vec![]).unwrap();
        assert!(writer.is_empty());
    }
}
