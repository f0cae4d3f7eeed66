//! Health check HTTP endpoint.
//!
//! # Responsibilities
//! - Bind the health port before anything else starts
//! - Answer every request with the current status code
//! - Hand out a cloneable handle for status updates

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;

use crate::config::HealthConfig;
use crate::health::state::{HealthState, HealthStatus, TransitionError};
use crate::net::{bind_listener, BindError, ListenerBinding, ListenerKind};

/// Failure to start the health endpoint.
#[derive(Debug, Error)]
pub enum HealthError {
    #[error(transparent)]
    Bind(#[from] BindError),
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

/// Handle to the running health endpoint.
#[derive(Clone)]
pub struct HealthCheck {
    state: Arc<HealthState>,
    binding: ListenerBinding,
}

impl HealthCheck {
    /// Bind `addr` and start answering health probes with `initial`.
    ///
    /// Returns once the socket is bound; serving continues in a background
    /// task for the rest of the process. Waiting for HTTP binds enables the
    /// Unavailable → Failed transition.
    pub async fn serve(
        initial: HealthStatus,
        addr: SocketAddr,
        settings: &HealthConfig,
    ) -> Result<Self, HealthError> {
        let (listener, binding) = bind_listener(ListenerKind::Health, "health", addr).await?;
        let ready_code =
            StatusCode::from_u16(settings.ready_status_code).unwrap_or(StatusCode::OK);
        let state = Arc::new(
            HealthState::new(initial, ready_code).with_early_failure(settings.await_http_bind),
        );

        let app = Router::new()
            .fallback(health_handler)
            .with_state(state.clone());

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Health check server stopped");
            }
        });

        tracing::info!(
            port = binding.port(),
            status = %initial,
            "Health check server started"
        );

        Ok(Self { state, binding })
    }

    /// Move to `status`; rejected transitions are logged and returned.
    pub fn set(&self, status: HealthStatus) -> Result<(), TransitionError> {
        self.state.set(status).inspect_err(|e| {
            tracing::warn!(error = %e, "Ignoring health status change");
        })
    }

    /// Report the collector as ready.
    pub fn ready(&self) {
        let _ = self.set(HealthStatus::Ready);
    }

    pub fn status(&self) -> HealthStatus {
        self.state.status()
    }

    pub fn history(&self) -> Vec<HealthStatus> {
        self.state.history()
    }

    pub fn binding(&self) -> &ListenerBinding {
        &self.binding
    }
}

async fn health_handler(State(state): State<Arc<HealthState>>) -> Response {
    let body = HealthBody {
        status: state.status().as_str(),
    };
    (state.status_code(), Json(body)).into_response()
}
