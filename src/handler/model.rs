//! Span wire models for both ingestion formats.

use serde::{Deserialize, Serialize};

/// Key/value annotation on a span or process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: serde_json::Value,
}

/// Service emitting a batch of native spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub service_name: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Span in the native (primary) format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub trace_id: String,
    pub span_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    pub operation_name: String,
    /// Microseconds since the Unix epoch.
    pub start_time: u64,
    /// Microseconds.
    pub duration: u64,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Native batch: one process, many spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub process: Process,
    pub spans: Vec<Span>,
}

/// Endpoint annotation on a zipkin span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    #[serde(default)]
    pub service_name: Option<String>,
}

/// Span in the zipkin-compatible (secondary) format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipkinSpan {
    pub trace_id: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_endpoint: Option<Endpoint>,
}

/// Per-batch (or per-span) acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub ok: bool,
}

/// Format a span arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanFormat {
    Native,
    Zipkin,
}

impl SpanFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanFormat::Native => "native",
            SpanFormat::Zipkin => "zipkin",
        }
    }
}

/// Format-independent span handed to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSpan {
    pub format: SpanFormat,
    pub service_name: String,
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub operation_name: String,
    pub start_time: u64,
    pub duration: u64,
}

impl StoredSpan {
    pub fn from_native(process: &Process, span: &Span) -> Self {
        Self {
            format: SpanFormat::Native,
            service_name: process.service_name.clone(),
            trace_id: span.trace_id.clone(),
            span_id: span.span_id.clone(),
            parent_span_id: span.parent_span_id.clone(),
            operation_name: span.operation_name.clone(),
            start_time: span.start_time,
            duration: span.duration,
        }
    }

    pub fn from_zipkin(span: &ZipkinSpan) -> Self {
        let service_name = span
            .local_endpoint
            .as_ref()
            .and_then(|e| e.service_name.clone())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            format: SpanFormat::Zipkin,
            service_name,
            trace_id: span.trace_id.clone(),
            span_id: span.id.clone(),
            parent_span_id: span.parent_id.clone(),
            operation_name: span.name.clone(),
            start_time: span.timestamp.unwrap_or_default(),
            duration: span.duration.unwrap_or_default(),
        }
    }

    /// Spans without trace or span id cannot be stored.
    pub fn is_valid(&self) -> bool {
        !self.trace_id.is_empty() && !self.span_id.is_empty()
    }
}
