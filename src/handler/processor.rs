//! Span handlers for both ingestion formats.
//!
//! # Responsibilities
//! - Normalise native batches and zipkin spans into `StoredSpan`
//! - Drop spans that cannot be stored, counting them
//! - Write the rest through the configured `SpanWriter`

use std::sync::Arc;

use thiserror::Error;

use crate::handler::model::{Batch, SpanFormat, StoredSpan, SubmitResponse, ZipkinSpan};
use crate::handler::writer::{SpanWriter, WriterError};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("failed to write span {span_id} of trace {trace_id}: {source}")]
    Write {
        trace_id: String,
        span_id: String,
        #[source]
        source: WriterError,
    },
}

/// Handles batches in the native format.
pub trait BatchesHandler: Send + Sync {
    fn submit_batches(&self, batches: Vec<Batch>) -> Result<Vec<SubmitResponse>, HandlerError>;
}

/// Handles spans in the zipkin-compatible format.
pub trait ZipkinSpansHandler: Send + Sync {
    fn submit_zipkin_batch(
        &self,
        spans: Vec<ZipkinSpan>,
    ) -> Result<Vec<SubmitResponse>, HandlerError>;
}

/// Validates spans and forwards them to storage.
pub struct SpanProcessor {
    writer: Arc<dyn SpanWriter>,
}

impl SpanProcessor {
    pub fn new(writer: Arc<dyn SpanWriter>) -> Self {
        Self { writer }
    }

    /// Process one group of spans; `Ok(true)` when every span was accepted.
    fn process<I>(&self, format: SpanFormat, spans: I) -> Result<bool, HandlerError>
    where
        I: IntoIterator<Item = StoredSpan>,
    {
        let mut accepted = 0;
        let mut rejected = 0;

        for span in spans {
            if !span.is_valid() {
                tracing::debug!(
                    format = format.as_str(),
                    trace_id = %span.trace_id,
                    span_id = %span.span_id,
                    "Rejecting span without ids"
                );
                rejected += 1;
                continue;
            }

            self.writer
                .write_span(&span)
                .map_err(|source| HandlerError::Write {
                    trace_id: span.trace_id.clone(),
                    span_id: span.span_id.clone(),
                    source,
                })?;
            accepted += 1;
        }

        metrics::record_spans(format.as_str(), accepted, rejected);
        Ok(rejected == 0)
    }
}

impl BatchesHandler for SpanProcessor {
    fn submit_batches(&self, batches: Vec<Batch>) -> Result<Vec<SubmitResponse>, HandlerError> {
        batches
            .iter()
            .map(|batch| {
                let spans = batch
                    .spans
                    .iter()
                    .map(|span| StoredSpan::from_native(&batch.process, span));
                let ok = self.process(SpanFormat::Native, spans)?;
                Ok(SubmitResponse { ok })
            })
            .collect()
    }
}

impl ZipkinSpansHandler for SpanProcessor {
    fn submit_zipkin_batch(
        &self,
        spans: Vec<ZipkinSpan>,
    ) -> Result<Vec<SubmitResponse>, HandlerError> {
        spans
            .iter()
            .map(|span| {
                let ok = self.process(SpanFormat::Zipkin, [StoredSpan::from_zipkin(span)])?;
                Ok(SubmitResponse { ok })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::model::{Process, Span};
    use crate::handler::writer::MemoryWriter;

    struct BrokenWriter;

    impl SpanWriter for BrokenWriter {
        fn write_span(&self, _span: &StoredSpan) -> Result<(), WriterError> {
            Err(WriterError::Unavailable("disk full".into()))
        }
    }

    fn span(trace_id: &str, span_id: &str) -> Span {
        Span {
            trace_id: trace_id.into(),
            span_id: span_id.into(),
            parent_span_id: None,
            operation_name: "op".into(),
            start_time: 1,
            duration: 2,
            tags: vec![],
        }
    }

    fn batch(spans: Vec<Span>) -> Batch {
        Batch {
            process: Process {
                service_name: "svc".into(),
                tags: vec![],
            },
            spans,
        }
    }

    #[test]
    fn writes_valid_spans_and_flags_rejections() {
        let writer = Arc::new(MemoryWriter::new());
        let processor = SpanProcessor::new(writer.clone());

        let responses = processor
            .submit_batches(vec![
                batch(vec![span("t1", "s1"), span("t1", "s2")]),
                batch(vec![span("t2", "s3"), span("", "s4")]),
            ])
            .unwrap();

        assert_eq!(
            responses,
            vec![SubmitResponse { ok: true }, SubmitResponse { ok: false }]
        );
        assert_eq!(writer.len(), 3);
        assert!(writer.spans().iter().all(|s| s.service_name == "svc"));
    }

    #[test]
    fn zipkin_gets_one_response_per_span() {
        let writer = Arc::new(MemoryWriter::new());
        let processor = SpanProcessor::new(writer.clone());

        let spans = vec![
            ZipkinSpan {
                trace_id: "t".into(),
                id: "a".into(),
                parent_id: None,
                name: "op".into(),
                timestamp: Some(10),
                duration: Some(5),
                local_endpoint: None,
            },
            ZipkinSpan {
                trace_id: "t".into(),
                id: String::new(),
                parent_id: None,
                name: "op".into(),
                timestamp: None,
                duration: None,
                local_endpoint: None,
            },
        ];

        let responses = processor.submit_zipkin_batch(spans).unwrap();
        assert_eq!(
            responses,
            vec![SubmitResponse { ok: true }, SubmitResponse { ok: false }]
        );
        assert_eq!(writer.spans()[0].format, SpanFormat::Zipkin);
    }

    #[test]
    fn writer_failure_is_an_error() {
        let processor = SpanProcessor::new(Arc::new(BrokenWriter));
        let err = processor
            .submit_batches(vec![batch(vec![span("t", "s")])])
            .unwrap_err();
        assert!(err.to_string().contains("disk full"));
    }
}
