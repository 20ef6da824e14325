// mcp-tester/src/relay.rs
//! The request/response contract of the HTTP routes that sit in front of
//! the [`ConnectionManager`].

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;

use crate::config::RelayConfig;
use crate::error::ConnectionError;
use crate::manager::ConnectionManager;
use crate::types::{Endpoint, Headers, TransportTag};

/// Body of a connect request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_type: Option<TransportTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
}

/// Body of a tool call request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_type: Option<TransportTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,
}

/// Status and JSON body to send back
#[derive(Debug, Clone, PartialEq)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

impl RelayResponse {
    fn ok(body: serde_json::Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "message": message.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Validates relay requests, runs them under a deadline and shapes the response
pub struct Relay {
    manager: Arc<ConnectionManager>,
    config: RelayConfig,
}

impl Relay {
    pub fn new(manager: Arc<ConnectionManager>, config: RelayConfig) -> Self {
        Self { manager, config }
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    /// Connect to a server and report its tools, resources and capabilities
    pub async fn connect(&self, request: ConnectRequest) -> RelayResponse {
        let Some(url) = non_blank(request.url) else {
            return RelayResponse::message(StatusCode::BAD_REQUEST, "Server URL is required");
        };
        let endpoint = endpoint(url, request.transport_type, request.headers);

        let description = format!("Connection to {}", endpoint.address);
        self.run(description, self.manager.connect(&endpoint)).await
    }

    /// Call one tool; missing arguments are sent as `{}`
    pub async fn call_tool(&self, request: CallToolRequest) -> RelayResponse {
        let (Some(url), Some(tool_name)) = (non_blank(request.url), non_blank(request.tool_name)) else {
            return RelayResponse::message(StatusCode::BAD_REQUEST, "Server URL and tool name are required");
        };
        let endpoint = endpoint(url, request.transport_type, request.headers);
        let arguments = request.arguments.unwrap_or_else(|| json!({}));

        let description = format!("Tool call {}", tool_name);
        self.run(description, self.manager.call_tool(&endpoint, &tool_name, arguments))
            .await
    }

    async fn run<T, F>(&self, description: String, operation: F) -> RelayResponse
    where
        T: Serialize,
        F: Future<Output = Result<T, ConnectionError>>,
    {
        match tokio::time::timeout(self.config.deadline, operation).await {
            Ok(Ok(result)) => match serde_json::to_value(result) {
                Ok(body) => RelayResponse::ok(body),
                Err(err) => {
                    tracing::error!(error = %err, "Failed to serialize relay response");
                    RelayResponse::message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                }
            },
            Ok(Err(err)) => RelayResponse::message(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            Err(_) => {
                let message = format!("{} timed out after {:?}", description, self.config.deadline);
                tracing::warn!(deadline = ?self.config.deadline, "{}", message);
                RelayResponse::message(StatusCode::GATEWAY_TIMEOUT, message)
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn endpoint(url: String, transport: Option<TransportTag>, headers: Option<Headers>) -> Endpoint {
    let endpoint = Endpoint::new(url).with_headers(headers.unwrap_or_default());
    match transport {
        Some(tag) => endpoint.with_transport(tag),
        None => endpoint,
    }
}
