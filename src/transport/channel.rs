//! RPC channel: listener plus per-connection frame loop.
//!
//! # Responsibilities
//! - Bind the transport port synchronously
//! - Accept connections in a background task
//! - Read call frames and write replies in request order
//!
//! # Design Decisions
//! - Accept errors are logged and the loop keeps going
//! - A broken frame stream closes only that connection
//! - Services may be registered after bind; the registry is shared

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;

use crate::net::{
    bind_listener, BindError, ConnectionGuard, ConnectionTracker, ListenerBinding, ListenerKind,
};
use crate::transport::server::ServiceRegistry;
use crate::transport::wire;

/// Default cap on a single frame.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("channel service name must not be empty")]
    EmptyServiceName,

    #[error(transparent)]
    Bind(#[from] BindError),
}

/// A named transport endpoint.
pub struct Channel {
    service_name: String,
    registry: ServiceRegistry,
    tracker: ConnectionTracker,
    max_frame_bytes: usize,
}

impl Channel {
    pub fn new(service_name: &str) -> Result<Self, TransportError> {
        if service_name.trim().is_empty() {
            return Err(TransportError::EmptyServiceName);
        }
        Ok(Self {
            service_name: service_name.to_string(),
            registry: ServiceRegistry::default(),
            tracker: ConnectionTracker::new(),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        })
    }

    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Number of open client connections.
    pub fn active_connections(&self) -> u64 {
        self.tracker.active_count()
    }

    /// Bind `addr` and start accepting calls.
    ///
    /// Returns once the socket is bound and listening.
    pub async fn bind(&self, addr: SocketAddr) -> Result<ListenerBinding, TransportError> {
        let (listener, binding) = bind_listener(ListenerKind::Rpc, "transport", addr).await?;

        tracing::info!(
            channel = %self.service_name,
            port = binding.port(),
            "Transport channel listening"
        );

        tokio::spawn(accept_loop(
            listener,
            self.registry.clone(),
            self.tracker.clone(),
            self.max_frame_bytes,
        ));

        Ok(binding)
    }
}

async fn accept_loop(
    listener: TcpListener,
    registry: ServiceRegistry,
    tracker: ConnectionTracker,
    max_frame_bytes: usize,
) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let guard = tracker.track();
                tracing::debug!(connection_id = %guard.id(), peer = %peer, "Transport connection accepted");
                tokio::spawn(serve_connection(
                    stream,
                    guard,
                    registry.clone(),
                    max_frame_bytes,
                ));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Transport accept failed");
                // Out of descriptors: back off instead of spinning.
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    guard: ConnectionGuard,
    registry: ServiceRegistry,
    max_frame_bytes: usize,
) {
    let mut framed = Framed::new(stream, wire::codec(max_frame_bytes));

    while let Some(frame) = framed.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(connection_id = %guard.id(), error = %e, "Dropping transport connection");
                break;
            }
        };

        let reply = registry.dispatch(&frame).await;
        let bytes = match wire::encode(&reply) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(connection_id = %guard.id(), error = %e, "Failed to encode reply");
                break;
            }
        };

        if let Err(e) = framed.send(bytes).await {
            tracing::debug!(connection_id = %guard.id(), error = %e, "Failed to send reply");
            break;
        }
    }
}
