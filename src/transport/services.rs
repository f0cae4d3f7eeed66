//! Collector services exposed over the transport.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::handler::{Batch, BatchesHandler, ZipkinSpan, ZipkinSpansHandler};
use crate::observability::metrics;
use crate::transport::server::RpcService;
use crate::transport::wire::RpcError;

pub const COLLECTOR_SERVICE: &str = "Collector";
pub const SUBMIT_BATCHES: &str = "submitBatches";
pub const ZIPKIN_COLLECTOR_SERVICE: &str = "ZipkinCollector";
pub const SUBMIT_ZIPKIN_BATCH: &str = "submitZipkinBatch";

fn decode<T: DeserializeOwned>(body: Value) -> Result<T, RpcError> {
    serde_json::from_value(body).map_err(RpcError::bad_request)
}

fn encode<T: Serialize>(value: &T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(RpcError::handler)
}

/// Native-format batches.
pub struct CollectorService {
    handler: Arc<dyn BatchesHandler>,
}

impl CollectorService {
    pub fn new(handler: Arc<dyn BatchesHandler>) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl RpcService for CollectorService {
    fn name(&self) -> &'static str {
        COLLECTOR_SERVICE
    }

    async fn handle(&self, method: &str, body: Value) -> Result<Value, RpcError> {
        if method != SUBMIT_BATCHES {
            return Err(RpcError::unknown_method(COLLECTOR_SERVICE, method));
        }

        let batches: Vec<Batch> = decode(body)?;
        for _ in &batches {
            metrics::record_batch("native", "rpc");
        }
        let responses = self
            .handler
            .submit_batches(batches)
            .map_err(RpcError::handler)?;
        encode(&responses)
    }
}

/// Zipkin-format spans.
pub struct ZipkinCollectorService {
    handler: Arc<dyn ZipkinSpansHandler>,
}

impl ZipkinCollectorService {
    pub fn new(handler: Arc<dyn ZipkinSpansHandler>) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl RpcService for ZipkinCollectorService {
    fn name(&self) -> &'static str {
        ZIPKIN_COLLECTOR_SERVICE
    }

    async fn handle(&self, method: &str, body: Value) -> Result<Value, RpcError> {
        if method != SUBMIT_ZIPKIN_BATCH {
            return Err(RpcError::unknown_method(ZIPKIN_COLLECTOR_SERVICE, method));
        }

        let spans: Vec<ZipkinSpan> = decode(body)?;
        metrics::record_batch("zipkin", "rpc");
        let responses = self
            .handler
            .submit_zipkin_batch(spans)
            .map_err(RpcError::handler)?;
        encode(&responses)
    }
}
