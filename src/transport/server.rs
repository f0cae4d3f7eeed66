//! Service registration and call dispatch.
//!
//! # Responsibilities
//! - Hold the named services a channel dispatches to
//! - Route each call frame to `service.handle(method, body)`
//! - Turn every failure into an error reply, never a dropped connection

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::observability::metrics;
use crate::transport::channel::Channel;
use crate::transport::wire::{CallFrame, ReplyFrame, RpcError, RpcErrorCode};

/// A named service reachable over the transport.
#[async_trait]
pub trait RpcService: Send + Sync + 'static {
    /// Name callers address the service by.
    fn name(&self) -> &'static str;

    async fn handle(&self, method: &str, body: Value) -> Result<Value, RpcError>;
}

/// Services registered on one channel, shared with its connections.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: Arc<RwLock<HashMap<String, Arc<dyn RpcService>>>>,
}

impl ServiceRegistry {
    /// Add `service`, returning the registration it replaced.
    pub fn insert(&self, service: Arc<dyn RpcService>) -> Option<Arc<dyn RpcService>> {
        let mut services = self.services.write().unwrap_or_else(|e| e.into_inner());
        services.insert(service.name().to_string(), service)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn RpcService>> {
        let services = self.services.read().unwrap_or_else(|e| e.into_inner());
        services.get(name).cloned()
    }

    /// Registered service names, sorted.
    pub fn names(&self) -> Vec<String> {
        let services = self.services.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = services.keys().cloned().collect();
        names.sort();
        names
    }

    /// Decode one frame and run the call it names.
    pub async fn dispatch(&self, frame: &[u8]) -> ReplyFrame {
        let call: CallFrame = match serde_json::from_slice(frame) {
            Ok(call) => call,
            Err(e) => {
                return ReplyFrame::err(0, RpcError::new(RpcErrorCode::BadFrame, e.to_string()))
            }
        };

        let Some(service) = self.get(&call.service) else {
            tracing::debug!(service = %call.service, "Call for unknown service");
            return ReplyFrame::err(call.id, RpcError::unknown_service(&call.service));
        };

        let result = service.handle(&call.method, call.body).await;
        metrics::record_rpc_call(&call.service, &call.method, result.is_ok());

        match result {
            Ok(value) => ReplyFrame::ok(call.id, value),
            Err(error) => {
                tracing::debug!(
                    service = %call.service,
                    method = %call.method,
                    error = %error,
                    "Call failed"
                );
                ReplyFrame::err(call.id, error)
            }
        }
    }
}

/// Registers services against a channel.
pub struct TransportServer {
    registry: ServiceRegistry,
}

impl TransportServer {
    pub fn new(channel: &Channel) -> Self {
        Self {
            registry: channel.registry().clone(),
        }
    }

    /// Attach `service`; a service with the same name is replaced.
    pub fn register<S: RpcService>(&self, service: S) {
        let name = service.name();
        if self.registry.insert(Arc::new(service)).is_some() {
            tracing::warn!(service = name, "Replaced existing service registration");
        } else {
            tracing::info!(service = name, "Service registered");
        }
    }

    pub fn services(&self) -> Vec<String> {
        self.registry.names()
    }
}
