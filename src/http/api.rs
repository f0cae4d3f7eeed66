//! Primary ingestion API.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use crate::handler::{Batch, BatchesHandler};
use crate::observability::metrics;

pub const TRACES_PATH: &str = "/api/traces";

/// Routes of the primary API.
pub fn routes(handler: Arc<dyn BatchesHandler>) -> Router {
    Router::new()
        .route(TRACES_PATH, post(submit_batch))
        .with_state(handler)
}

async fn submit_batch(
    State(handler): State<Arc<dyn BatchesHandler>>,
    Json(batch): Json<Batch>,
) -> Response {
    metrics::record_batch("native", "http");
    let spans = batch.spans.len();

    match handler.submit_batches(vec![batch]) {
        Ok(_) => {
            tracing::debug!(spans, "Batch accepted");
            StatusCode::ACCEPTED.into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Cannot submit batch");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Cannot submit batch: {e}"),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{MemoryWriter, SpanProcessor};
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    fn post_json(body: &str) -> Request<Body> {
        Request::post(TRACES_PATH)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn batch_is_accepted_and_written() {
        let writer = Arc::new(MemoryWriter::new());
        let app = routes(Arc::new(SpanProcessor::new(writer.clone())));

        let res = app
            .oneshot(post_json(
                r#"{"process":{"serviceName":"web"},"spans":[
                    {"traceId":"a","spanId":"b","operationName":"GET /","startTime":1,"duration":3}
                ]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::ACCEPTED);
        assert_eq!(writer.spans()[0].operation_name, "GET /");
    }

    #[tokio::test]
    async fn malformed_batch_is_rejected() {
        let writer = Arc::new(MemoryWriter::new());
        let app = routes(Arc::new(SpanProcessor::new(writer.clone())));

        let res = app.oneshot(post_json(r#"{"spans": 5}"#)).await.unwrap();

        assert!(res.status().is_client_error());
        assert!(writer.is_empty());
    }
}
