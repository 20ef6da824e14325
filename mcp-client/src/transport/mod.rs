// mcp-client/src/transport/mod.rs
pub mod sse;
pub mod stdio;
pub mod streamable_http;

use anyhow::{Context, Result};
use async_trait::async_trait;
use mcp_protocol::messages::JsonRpcMessage;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Transport trait for sending and receiving MCP messages
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Start the transport; every message received from the server is pushed to `message_tx`
    async fn start(&self, message_tx: mpsc::Sender<JsonRpcMessage>) -> Result<()>;

    /// Send a message to the server
    async fn send(&self, message: JsonRpcMessage) -> Result<()>;

    /// Close the transport
    async fn close(&self) -> Result<()>;
}

pub use sse::SseTransport;
pub use stdio::StdioTransport;
pub use streamable_http::StreamableHttpTransport;

/// Convert caller-supplied headers into a reqwest header map, unchanged
pub(crate) fn header_map(headers: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .with_context(|| format!("invalid header name '{}'", name))?;
        let header_value = HeaderValue::from_str(value)
            .with_context(|| format!("invalid value for header '{}'", name))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// Forward a message received from the server, logging if nobody is listening
pub(crate) async fn forward(message_tx: &mpsc::Sender<JsonRpcMessage>, message: JsonRpcMessage) -> bool {
    if message_tx.send(message).await.is_err() {
        tracing::debug!("Message receiver dropped, stopping reader");
        return false;
    }
    true
}
