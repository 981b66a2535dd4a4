//! JSON-RPC 2.0 protocol implementation
//!
//! Defines the request/response envelopes exchanged with the host and the
//! error codes the host can branch on.

use crate::error::HearthError;
use crate::utils::string::truncate_at_char_boundary;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
/// Any failure inside a tool, resource or prompt handler
pub const SERVER_ERROR: i32 = -32000;

/// Longest handler error message sent to the host
pub const MAX_ERROR_MESSAGE: usize = 200;

/// JSON-RPC request envelope
///
/// `jsonrpc` is accepted but not enforced; hosts that omit it are served.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,

    /// Method name to invoke
    pub method: String,

    /// Parameters (object expected by every current method)
    #[serde(default)]
    pub params: Value,

    /// Request ID (absent for notifications)
    #[serde(default)]
    pub id: Option<Value>,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC response envelope; exactly one of `result` and `error` is set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,

    /// Request ID (echoed from request)
    pub id: Option<Value>,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcError {
    /// Invalid request (-32600)
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: INVALID_REQUEST,
            message: message.into(),
        }
    }

    /// Method not found (-32601)
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self {
            code: METHOD_NOT_FOUND,
            message: format!("Method not found: {}", method.into()),
        }
    }

    /// Invalid params (-32602)
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: INVALID_PARAMS,
            message: message.into(),
        }
    }

    /// Handler failure (-32000), message bounded
    pub fn server_error(message: impl AsRef<str>) -> Self {
        Self {
            code: SERVER_ERROR,
            message: truncate_at_char_boundary(message.as_ref(), MAX_ERROR_MESSAGE),
        }
    }
}

impl From<&HearthError> for JsonRpcError {
    fn from(err: &HearthError) -> Self {
        match err {
            HearthError::InvalidParams(msg) => JsonRpcError::invalid_params(msg.clone()),
            HearthError::UnknownTool(_) | HearthError::PromptNotFound(_) => Self {
                code: METHOD_NOT_FOUND,
                message: err.to_string(),
            },
            other => JsonRpcError::server_error(other.to_string()),
        }
    }
}
