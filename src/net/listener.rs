//! TCP listener binding.
//!
//! # Responsibilities
//! - Bind a TCP socket for one front-end
//! - Describe the bound endpoint as a `ListenerBinding`
//! - Report bind failures with the address that was attempted

use std::net::SocketAddr;
use std::time::SystemTime;

use thiserror::Error;
use tokio::net::TcpListener;

/// Kind of endpoint a listener serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    /// Framed RPC transport.
    Rpc,
    /// HTTP ingestion front-end.
    Http,
    /// Health check endpoint.
    Health,
}

impl std::fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerKind::Rpc => write!(f, "rpc"),
            ListenerKind::Http => write!(f, "http"),
            ListenerKind::Health => write!(f, "health"),
        }
    }
}

/// One bound network endpoint.
///
/// Owned by the component that bound it; lives until process exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerBinding {
    pub kind: ListenerKind,
    pub name: &'static str,
    pub local_addr: SocketAddr,
    pub created_at: SystemTime,
}

impl ListenerBinding {
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }
}

/// Failure to bind a listener.
#[derive(Debug, Error)]
#[error("failed to bind {kind} listener {name} on {addr}: {source}")]
pub struct BindError {
    pub kind: ListenerKind,
    pub name: &'static str,
    pub addr: SocketAddr,
    #[source]
    pub source: std::io::Error,
}

/// Bind a TCP listener; the socket accepts connections once this returns.
pub async fn bind_listener(
    kind: ListenerKind,
    name: &'static str,
    addr: SocketAddr,
) -> Result<(TcpListener, ListenerBinding), BindError> {
    let bind_error = |source| BindError {
        kind,
        name,
        addr,
        source,
    };

    let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
    let local_addr = listener.local_addr().map_err(bind_error)?;

    tracing::info!(
        kind = %kind,
        listener = name,
        address = %local_addr,
        "Listener bound"
    );

    let binding = ListenerBinding {
        kind,
        name,
        local_addr,
        created_at: SystemTime::now(),
    };
    Ok((listener, binding))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binding_reports_local_addr() {
        let (listener, binding) =
            bind_listener(ListenerKind::Http, "test", "127.0.0.1:0".parse().unwrap())
                .await
                .unwrap();

        assert_eq!(binding.local_addr, listener.local_addr().unwrap());
        assert_ne!(binding.port(), 0);
        assert_eq!(binding.kind, ListenerKind::Http);
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let (_held, binding) =
            bind_listener(ListenerKind::Rpc, "first", "127.0.0.1:0".parse().unwrap())
                .await
                .unwrap();

        let err = bind_listener(ListenerKind::Rpc, "second", binding.local_addr)
            .await
            .unwrap_err();
        assert_eq!(err.addr, binding.local_addr);
        assert_eq!(err.source.kind(), std::io::ErrorKind::AddrInUse);
    }
}
