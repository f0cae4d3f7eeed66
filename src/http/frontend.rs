//! HTTP front-end setup.
//!
//! # Responsibilities
//! - Wrap an externally supplied route table in the shared middleware stack
//! - Bind the configured port and acknowledge the bind
//! - Serve until the listener fails or closes
//!
//! # States
//! ```text
//! NotStarted → Listening → Terminated (error or close)
//! ```
//! There is no graceful stop; a listening front-end runs for the life of the
//! process.

use std::net::SocketAddr;

use axum::{extract::DefaultBodyLimit, Router};
use thiserror::Error;
use tokio::sync::oneshot;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::HttpConfig;
use crate::http::recovery::RecoveryLayer;
use crate::net::{bind_listener, BindError, ListenerBinding, ListenerKind};

/// Which ingestion API a front-end serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontendRole {
    /// Main ingestion API; its failure marks the collector unhealthy.
    Primary,
    /// Optional zipkin-compatible API.
    Zipkin,
}

impl FrontendRole {
    pub fn name(&self) -> &'static str {
        match self {
            FrontendRole::Primary => "api",
            FrontendRole::Zipkin => "zipkin",
        }
    }
}

impl std::fmt::Display for FrontendRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Bind(#[from] BindError),

    #[error("{frontend} server failed: {source}")]
    Serve {
        frontend: FrontendRole,
        #[source]
        source: std::io::Error,
    },
}

/// Apply the middleware every front-end shares.
///
/// Recovery sits innermost so a panic still passes through tracing and
/// request-id handling as an ordinary 500. The body limit applies twice: to
/// the bytes on the wire, and through the extractors to the body a route
/// actually reads, which for gzip requests is the decompressed one.
pub fn build_app(role: FrontendRole, routes: Router, settings: &HttpConfig) -> Router {
    routes
        .layer(RecoveryLayer::new(role.name(), settings.recovery_print_stack))
        .layer(DefaultBodyLimit::max(settings.max_body_bytes))
        .layer(RequestBodyLimitLayer::new(settings.max_body_bytes))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// One HTTP listener serving one route table.
pub struct HttpFrontend {
    role: FrontendRole,
    addr: SocketAddr,
    routes: Router,
    settings: HttpConfig,
}

impl HttpFrontend {
    pub fn new(role: FrontendRole, addr: SocketAddr, routes: Router) -> Self {
        Self {
            role,
            addr,
            routes,
            settings: HttpConfig::default(),
        }
    }

    pub fn with_settings(mut self, settings: HttpConfig) -> Self {
        self.settings = settings;
        self
    }

    pub fn role(&self) -> FrontendRole {
        self.role
    }

    /// Bind and serve.
    ///
    /// `bound` receives the binding as soon as the socket listens; it is
    /// dropped unsent when the bind fails. Returns `Ok(())` only if the
    /// listener closes without an error.
    pub async fn serve(
        self,
        bound: Option<oneshot::Sender<ListenerBinding>>,
    ) -> Result<(), FrontendError> {
        let (listener, binding) =
            bind_listener(ListenerKind::Http, self.role.name(), self.addr).await?;

        tracing::info!(
            frontend = %self.role,
            port = binding.port(),
            "Listening for HTTP traffic"
        );
        if let Some(bound) = bound {
            let _ = bound.send(binding);
        }

        let app = build_app(self.role, self.routes, &self.settings);
        axum::serve(listener, app)
            .await
            .map_err(|source| FrontendError::Serve {
                frontend: self.role,
                source,
            })
    }
}
