// mcp-client/src/error.rs
use thiserror::Error;

/// An error response returned by the server for one request.
///
/// Carried inside the `anyhow` chain so callers can downcast and look at
/// the JSON-RPC code instead of the message text.
#[derive(Debug, Clone, Error)]
#[error("{method} error: {message} (code: {code})")]
pub struct RpcError {
    pub method: String,
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    pub fn new(method: &str, error: mcp_protocol::messages::JsonRpcError) -> Self {
        Self {
            method: method.to_string(),
            code: error.code,
            message: error.message,
            data: error.data,
        }
    }
}
