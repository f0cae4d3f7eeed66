//! Startup orchestration.
//!
//! # Responsibilities
//! - Start subsystems in dependency order, health endpoint first
//! - Launch the HTTP front-ends as background tasks
//! - Flip health to Ready and wait for a signal or a dead front-end
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and stops the sequence
//! - Front-end tasks never decide process fate themselves; they report a
//!   [`ListenerExit`] and the orchestrator applies the exit policy
//! - Ready is signalled once the front-ends are launched, not once they are
//!   bound, unless `health.await_http_bind` asks for bind acknowledgements
//!
//! # Startup Order
//! ```text
//! health server (Unavailable)
//!   → handler set
//!   → RPC channel bind
//!   → register Collector + ZipkinCollector
//!   → zipkin front-end (if port set) → primary front-end
//!   → health Ready
//!   → wait: signal ⇒ Ok, front-end exit ⇒ Err
//! ```

use std::future::Future;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::config::CollectorConfig;
use crate::handler::{BuildError, HandlerBuilder};
use crate::health::{HealthCheck, HealthError, HealthStatus};
use crate::http::{api, zipkin, FrontendError, FrontendRole, HttpFrontend};
use crate::lifecycle::signals::{ServiceHandle, Signal};
use crate::net::ListenerBinding;
use crate::transport::{
    Channel, CollectorService, TransportError, TransportServer, ZipkinCollectorService,
};

/// Fatal collector error. Any of these ends the process with a failure code.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("could not start the health check server: {0}")]
    HealthCheck(#[source] HealthError),

    #[error("unable to set up span handlers: {0}")]
    Handlers(#[source] BuildError),

    #[error("unable to create transport channel: {0}")]
    Channel(#[source] TransportError),

    #[error("unable to start listening on channel: {0}")]
    TransportBind(#[source] TransportError),

    #[error("could not launch {frontend} server: {source}")]
    Frontend {
        frontend: FrontendRole,
        #[source]
        source: FrontendError,
    },

    #[error("{frontend} server stopped accepting connections")]
    FrontendClosed { frontend: FrontendRole },
}

/// Report sent by a front-end task when its listener stops.
#[derive(Debug)]
pub struct ListenerExit {
    pub frontend: FrontendRole,
    pub outcome: Result<(), FrontendError>,
}

impl ListenerExit {
    fn into_error(self) -> CollectorError {
        match self.outcome {
            Ok(()) => CollectorError::FrontendClosed {
                frontend: self.frontend,
            },
            Err(source) => CollectorError::Frontend {
                frontend: self.frontend,
                source,
            },
        }
    }
}

/// Apply the exit policy to a stopped front-end and return the fatal error.
///
/// Only the primary front-end takes health down with it; the health status
/// is set before the error is returned.
pub fn handle_listener_exit(exit: ListenerExit, health: &HealthCheck) -> CollectorError {
    if exit.frontend == FrontendRole::Primary {
        let _ = health.set(HealthStatus::Failed);
    }
    let err = exit.into_error();
    tracing::error!(error = %err, "Front-end terminated");
    err
}

/// Startup progress, in the order it happens.
#[derive(Clone)]
pub enum LifecycleEvent {
    HealthServing(HealthCheck),
    HandlersBuilt,
    TransportBound(ListenerBinding),
    ServicesRegistered(Vec<String>),
    FrontendLaunched(FrontendRole),
    Ready,
}

/// Runs the collector from configuration to termination.
pub struct ServiceOrchestrator<B> {
    config: CollectorConfig,
    builder: B,
    events: Option<mpsc::UnboundedSender<LifecycleEvent>>,
}

impl<B: HandlerBuilder> ServiceOrchestrator<B> {
    pub fn new(config: CollectorConfig, builder: B) -> Self {
        Self {
            config,
            builder,
            events: None,
        }
    }

    /// Publish startup progress on `events`.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<LifecycleEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Run until a termination signal arrives or a front-end dies.
    pub async fn run(self, signals: ServiceHandle) -> Result<(), CollectorError> {
        self.run_until(signals.wait()).await
    }

    /// Run until `shutdown` resolves or a front-end dies.
    ///
    /// Returns `Ok(())` only for a signal-driven shutdown.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), CollectorError>
    where
        F: Future<Output = Signal>,
    {
        let opts = &self.config.collector;

        let health = HealthCheck::serve(
            HealthStatus::Unavailable,
            opts.health_addr(),
            &self.config.health,
        )
        .await
        .map_err(CollectorError::HealthCheck)?;
        self.emit(LifecycleEvent::HealthServing(health.clone()));

        let handlers = self.builder.build().map_err(CollectorError::Handlers)?;
        self.emit(LifecycleEvent::HandlersBuilt);

        let channel = Channel::new(&self.config.transport.service_name)
            .map_err(CollectorError::Channel)?
            .with_max_frame_bytes(self.config.transport.max_frame_bytes);
        let binding = channel
            .bind(opts.rpc_addr())
            .await
            .map_err(CollectorError::TransportBind)?;
        self.emit(LifecycleEvent::TransportBound(binding));

        let server = TransportServer::new(&channel);
        server.register(CollectorService::new(handlers.batches.clone()));
        server.register(ZipkinCollectorService::new(handlers.zipkin.clone()));
        self.emit(LifecycleEvent::ServicesRegistered(server.services()));

        let (exit_tx, mut exits) = mpsc::channel(2);
        let mut acks = Vec::with_capacity(2);

        if let Some(addr) = opts.zipkin_addr() {
            let frontend = HttpFrontend::new(
                FrontendRole::Zipkin,
                addr,
                zipkin::routes(handlers.zipkin.clone()),
            )
            .with_settings(self.config.http.clone());
            acks.push(self.launch(frontend, exit_tx.clone()));
        }

        tracing::info!(port = opts.http_port, "Starting HTTP server");
        let frontend = HttpFrontend::new(
            FrontendRole::Primary,
            opts.http_addr(),
            api::routes(handlers.batches.clone()),
        )
        .with_settings(self.config.http.clone());
        acks.push(self.launch(frontend, exit_tx));

        if self.config.health.await_http_bind {
            for ack in acks {
                if ack.await.is_err() {
                    // The task reports its bind error right after dropping the ack.
                    if let Some(exit) = exits.recv().await {
                        return Err(handle_listener_exit(exit, &health));
                    }
                }
            }
        }

        health.ready();
        self.emit(LifecycleEvent::Ready);
        tracing::info!("Collector is ready");

        tokio::select! {
            signal = shutdown => {
                tracing::info!(signal = %signal, "Collector is finishing");
                Ok(())
            }
            Some(exit) = exits.recv() => Err(handle_listener_exit(exit, &health)),
        }
    }

    fn launch(
        &self,
        frontend: HttpFrontend,
        exits: mpsc::Sender<ListenerExit>,
    ) -> oneshot::Receiver<ListenerBinding> {
        let (bound_tx, bound_rx) = oneshot::channel();
        let role = frontend.role();

        tokio::spawn(async move {
            let outcome = frontend.serve(Some(bound_tx)).await;
            let _ = exits
                .send(ListenerExit {
                    frontend: role,
                    outcome,
                })
                .await;
        });

        self.emit(LifecycleEvent::FrontendLaunched(role));
        bound_rx
    }

    fn emit(&self, event: LifecycleEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}
