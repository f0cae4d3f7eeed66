//! Zipkin-compatible ingestion API.
//!
//! Accepts gzip-encoded bodies as zipkin reporters commonly send them.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tower_http::decompression::RequestDecompressionLayer;

use crate::handler::{ZipkinSpan, ZipkinSpansHandler};
use crate::observability::metrics;

pub const SPANS_PATH: &str = "/api/v1/spans";

/// Routes of the zipkin API.
pub fn routes(handler: Arc<dyn ZipkinSpansHandler>) -> Router {
    Router::new()
        .route(SPANS_PATH, post(submit_spans))
        .with_state(handler)
        .layer(RequestDecompressionLayer::new())
}

async fn submit_spans(
    State(handler): State<Arc<dyn ZipkinSpansHandler>>,
    Json(spans): Json<Vec<ZipkinSpan>>,
) -> Response {
    metrics::record_batch("zipkin", "http");

    match handler.submit_zipkin_batch(spans) {
        Ok(_) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Cannot submit zipkin spans");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Cannot submit spans: {e}"),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::handler::{MemoryWriter, SpanProcessor};
    use crate::http::frontend::{build_app, FrontendRole};
    use axum::body::Body;
    use axum::http::{header, Request};
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;
    use tower::ServiceExt;

    fn gzip_request(json: &str) -> Request<Body> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(json.as_bytes()).unwrap();
        Request::post(SPANS_PATH)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_ENCODING, "gzip")
            .body(Body::from(encoder.finish().unwrap()))
            .unwrap()
    }

    fn app(writer: Arc<MemoryWriter>, max_body_bytes: usize) -> Router {
        let settings = HttpConfig {
            max_body_bytes,
            recovery_print_stack: false,
        };
        build_app(
            FrontendRole::Zipkin,
            routes(Arc::new(SpanProcessor::new(writer))),
            &settings,
        )
    }

    #[tokio::test]
    async fn gzip_spans_within_limit_are_accepted() {
        let writer = Arc::new(MemoryWriter::new());

        let res = app(writer.clone(), 64 * 1024)
            .oneshot(gzip_request(r#"[{"traceId":"t","id":"s","name":"db"}]"#))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::ACCEPTED);
        assert_eq!(writer.len(), 1);
    }

    #[tokio::test]
    async fn gzip_body_inflating_past_limit_is_rejected() {
        let limit = 64 * 1024;
        let writer = Arc::new(MemoryWriter::new());
        let span = r#"{"traceId":"t","id":"s","name":"db"}"#;
        let json = format!("[{}]", vec![span; 50_000].join(","));
        assert!(json.len() > limit);

        let req = gzip_request(&json);
        let (parts, body) = req.into_parts();
        let compressed = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        assert!(compressed.len() < limit);
        let req = Request::from_parts(parts, Body::from(compressed));

        let res = app(writer.clone(), limit).oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(writer.is_empty());
    }

    #[tokio::test]
    async fn spans_are_accepted() {
        let writer = Arc::new(MemoryWriter::new());
        let app = routes(Arc::new(SpanProcessor::new(writer.clone())));

        let req = Request::post(SPANS_PATH)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"[{"traceId":"t","id":"s","name":"db","localEndpoint":{"serviceName":"orders"}}]"#,
            ))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::ACCEPTED);
        assert_eq!(writer.spans()[0].service_name, "orders");
    }
}
