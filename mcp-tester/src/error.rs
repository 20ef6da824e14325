// mcp-tester/src/error.rs
use mcp_client::RpcError;
use mcp_protocol::constants::error_codes;
use std::io;
use thiserror::Error;

use crate::types::TransportTag;

/// A failure surfaced to the user.
///
/// The `Display` text of every variant is the message shown in the UI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("MCP server executable not found. Please check the server path.")]
    ExecutableNotFound,

    #[error("Failed to start MCP server process. Please verify the command.")]
    SpawnFailed,

    #[error("Connection refused. Please verify the server URL and ensure the server is running.")]
    ConnectionRefused,

    #[error("HTTP connection failed. Please check the URL and network connectivity.")]
    HttpFailed,

    #[error("Tool \"{tool}\" not found on the MCP server.")]
    ToolNotFound { tool: String },

    #[error("Invalid arguments provided for tool \"{tool}\".")]
    InvalidArguments { tool: String },

    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("Unsupported transport: {0}")]
    UnsupportedTransport(TransportTag),

    #[error("Unsupported protocol for URL: {0}")]
    UnsupportedProtocol(String),
}

/// The operation a failure happened in; tool calls carry the tool name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation<'a> {
    Connect,
    CallTool(&'a str),
}

const NOT_FOUND_INDICATORS: &[&str] = &["ENOENT", "No such file or directory", "program not found"];
const SPAWN_INDICATORS: &[&str] = &["spawn"];
const REFUSED_INDICATORS: &[&str] = &["ECONNREFUSED", "Connection refused", "connection refused"];
const FETCH_INDICATORS: &[&str] = &["fetch", "error sending request", "HTTP request to"];
const TOOL_NOT_FOUND_INDICATORS: &[&str] = &["Tool not found", "Unknown tool"];
const INVALID_ARGUMENTS_INDICATORS: &[&str] = &["Invalid arguments"];

/// Map a failure to the message shown to the user.
///
/// Classes are tried in a fixed order: executable not found, spawn failure,
/// connection refused, other HTTP failure, then (tool calls only) unknown
/// tool and invalid arguments. Typed causes in the error chain are checked
/// first; the rendered message is searched for known indicators after that.
pub fn classify(error: &anyhow::Error, operation: Operation<'_>) -> ConnectionError {
    let message = format!("{:#}", error);
    let mentions = |indicators: &[&str]| indicators.iter().any(|needle| message.contains(needle));
    let io_kind = |kind: io::ErrorKind| {
        error
            .chain()
            .filter_map(|cause| cause.downcast_ref::<io::Error>())
            .any(|io| io.kind() == kind)
    };

    if io_kind(io::ErrorKind::NotFound) || mentions(NOT_FOUND_INDICATORS) {
        return ConnectionError::ExecutableNotFound;
    }
    if mentions(SPAWN_INDICATORS) {
        return ConnectionError::SpawnFailed;
    }
    if io_kind(io::ErrorKind::ConnectionRefused) || mentions(REFUSED_INDICATORS) {
        return ConnectionError::ConnectionRefused;
    }
    if mentions(FETCH_INDICATORS) {
        return ConnectionError::HttpFailed;
    }

    match operation {
        Operation::Connect => ConnectionError::ConnectFailed(message),
        Operation::CallTool(tool) => {
            let tool = tool.to_string();
            let invalid_params = error
                .chain()
                .filter_map(|cause| cause.downcast_ref::<RpcError>())
                .any(|rpc| rpc.code == error_codes::INVALID_PARAMS);

            if mentions(TOOL_NOT_FOUND_INDICATORS) {
                ConnectionError::ToolNotFound { tool }
            } else if invalid_params || mentions(INVALID_ARGUMENTS_INDICATORS) {
                ConnectionError::InvalidArguments { tool }
            } else {
                ConnectionError::ToolCallFailed(message)
            }
        }
    }
}
