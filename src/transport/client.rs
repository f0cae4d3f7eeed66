//! Minimal transport client.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::transport::channel::DEFAULT_MAX_FRAME_BYTES;
use crate::transport::wire::{self, CallFrame, ReplyFrame, RpcError};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid frame: {0}")]
    Frame(#[from] serde_json::Error),

    #[error("connection closed before reply")]
    Closed,

    #[error("reply id {got} does not match call id {expected}")]
    MismatchedReply { expected: u64, got: u64 },

    #[error("remote error: {0}")]
    Remote(#[from] RpcError),
}

/// One connection to a transport channel; calls are sequential.
pub struct RpcClient {
    framed: Framed<TcpStream, LengthDelimitedCodec>,
    next_id: u64,
}

impl RpcClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            framed: Framed::new(stream, wire::codec(DEFAULT_MAX_FRAME_BYTES)),
            next_id: 1,
        })
    }

    /// Call `service.method` with `body` and wait for its reply.
    pub async fn call(
        &mut self,
        service: &str,
        method: &str,
        body: Value,
    ) -> Result<Value, ClientError> {
        let id = self.next_id;
        self.next_id += 1;

        let call = CallFrame {
            id,
            service: service.to_string(),
            method: method.to_string(),
            body,
        };
        self.framed.send(wire::encode(&call)?).await?;

        let frame = self.framed.next().await.ok_or(ClientError::Closed)??;
        let reply: ReplyFrame = serde_json::from_slice(&frame)?;
        if reply.id != id {
            return Err(ClientError::MismatchedReply {
                expected: id,
                got: reply.id,
            });
        }
        Ok(reply.into_result()?)
    }
}
