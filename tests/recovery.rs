//! Panic containment on a live HTTP front-end.

use axum::{routing::get, Router};
use reqwest::StatusCode;
use tokio::sync::oneshot;

use trace_collector::config::HttpConfig;
use trace_collector::http::{FrontendRole, HttpFrontend};

mod common;

async fn explode() -> &'static str {
    panic!("handler exploded")
}

#[tokio::test]
async fn test_panic_yields_one_500_and_listener_survives() {
    let routes = Router::new()
        .route("/explode", get(explode))
        .route("/ok", get(|| async { "fine" }));
    let settings = HttpConfig {
        recovery_print_stack: false,
        ..HttpConfig::default()
    };

    let (bound_tx, bound_rx) = oneshot::channel();
    tokio::spawn(
        HttpFrontend::new(FrontendRole::Primary, common::addr(29190), routes)
            .with_settings(settings)
            .serve(Some(bound_tx)),
    );
    let binding = bound_rx.await.unwrap();
    assert_eq!(binding.port(), 29190);

    let client = common::client();
    for _ in 0..2 {
        let res = client
            .get("http://127.0.0.1:29190/explode")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.headers().contains_key("x-request-id"));

        let res = client.get("http://127.0.0.1:29190/ok").send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.text().await.unwrap(), "fine");
    }
}
