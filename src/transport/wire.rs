//! Frame format of the RPC transport.
//!
//! Every frame is a 4-byte big-endian length followed by a JSON document.
//! A call names the service and method; the reply carries the same id and
//! either a result or an error.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio_util::codec::LengthDelimitedCodec;

/// Length-delimited codec capped at `max_frame_bytes`.
pub fn codec(max_frame_bytes: usize) -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(4)
        .max_frame_length(max_frame_bytes)
        .new_codec()
}

pub fn encode<T: Serialize>(frame: &T) -> Result<Bytes, serde_json::Error> {
    serde_json::to_vec(frame).map(Bytes::from)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallFrame {
    pub id: u64,
    pub service: String,
    pub method: String,
    #[serde(default)]
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyFrame {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl ReplyFrame {
    pub fn ok(id: u64, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: u64, error: RpcError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn into_result(self) -> Result<Value, RpcError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcErrorCode {
    UnknownService,
    UnknownMethod,
    BadRequest,
    HandlerError,
    BadFrame,
}

impl std::fmt::Display for RpcErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            RpcErrorCode::UnknownService => "unknown_service",
            RpcErrorCode::UnknownMethod => "unknown_method",
            RpcErrorCode::BadRequest => "bad_request",
            RpcErrorCode::HandlerError => "handler_error",
            RpcErrorCode::BadFrame => "bad_frame",
        };
        f.write_str(code)
    }
}

/// Error carried in a reply frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code}: {message}")]
pub struct RpcError {
    pub code: RpcErrorCode,
    pub message: String,
}

impl RpcError {
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unknown_service(service: &str) -> Self {
        Self::new(
            RpcErrorCode::UnknownService,
            format!("no service registered as {service:?}"),
        )
    }

    pub fn unknown_method(service: &str, method: &str) -> Self {
        Self::new(
            RpcErrorCode::UnknownMethod,
            format!("service {service:?} has no method {method:?}"),
        )
    }

    pub fn bad_request(err: impl std::fmt::Display) -> Self {
        Self::new(RpcErrorCode::BadRequest, err.to_string())
    }

    pub fn handler(err: impl std::fmt::Display) -> Self {
        Self::new(RpcErrorCode::HandlerError, err.to_string())
    }
}
