// mcp-tester/src/binding/mod.rs
mod event_http;
mod process;
mod stream_http;

pub use event_http::EventHttpBinding;
pub use process::{parse_process_address, ProcessBinding, ProcessCommand, PROCESS_SCHEMES};
pub use stream_http::StreamHttpBinding;

use async_trait::async_trait;
use mcp_client::{ClientBuilder, Client, Transport};
use mcp_protocol::types::{resource::Resource, tool::Tool};
use serde_json::json;

use crate::config::{CapabilitiesReport, ClientConfig};
use crate::error::{classify, ConnectionError, Operation};
use crate::types::{ConnectionResult, Headers, ResourceDescriptor, ToolCallResult, ToolDescriptor, TransportTag};

/// One open connection to one server.
///
/// A session lives for exactly one `connect` or `call_tool` and is closed
/// before that call returns.
#[async_trait]
pub trait Session: Send + Sync {
    async fn list_tools(&self) -> anyhow::Result<Vec<Tool>>;

    async fn list_resources(&self) -> anyhow::Result<Vec<Resource>>;

    async fn call_tool(&self, name: &str, arguments: &serde_json::Value) -> anyhow::Result<ToolCallResult>;

    /// Capabilities the server advertised while the session was opened
    async fn capabilities(&self) -> Option<serde_json::Value>;

    async fn close(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl Session for Client {
    async fn list_tools(&self) -> anyhow::Result<Vec<Tool>> {
        Client::list_tools(self).await
    }

    async fn list_resources(&self) -> anyhow::Result<Vec<Resource>> {
        Client::list_resources(self).await
    }

    async fn call_tool(&self, name: &str, arguments: &serde_json::Value) -> anyhow::Result<ToolCallResult> {
        Client::call_tool(self, name, arguments).await
    }

    async fn capabilities(&self) -> Option<serde_json::Value> {
        self.server_capabilities().await
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.shutdown().await
    }
}

/// One way of reaching MCP servers.
///
/// Implementors say which addresses they understand and how to open a
/// session; `connect` and `call_tool` are provided and take care of the
/// session lifecycle and error mapping.
#[async_trait]
pub trait TransportBinding: Send + Sync {
    /// The tag this binding is registered under
    fn tag(&self) -> TransportTag;

    /// Whether `address` has a scheme this binding understands
    fn supports_protocol(&self, address: &str) -> bool;

    /// Open and initialize a session. On failure nothing may be left open.
    async fn open_session(&self, address: &str, headers: &Headers) -> anyhow::Result<Box<dyn Session>>;

    /// How `connect` reports capabilities
    fn capabilities_report(&self) -> CapabilitiesReport {
        CapabilitiesReport::Placeholder
    }

    /// Open a session, list tools and resources concurrently, close the session.
    ///
    /// A failing listing degrades to an empty list; only a failure to open
    /// the session fails the call.
    async fn connect(&self, address: &str, headers: &Headers) -> Result<ConnectionResult, ConnectionError> {
        let session = self
            .open_session(address, headers)
            .await
            .map_err(|err| report(&self.tag(), &err, Operation::Connect))?;

        let (tools, resources) = tokio::join!(list_tools_or_empty(&*session), list_resources_or_empty(&*session));
        let capabilities = match self.capabilities_report() {
            CapabilitiesReport::Placeholder => placeholder_capabilities(),
            CapabilitiesReport::Reported => session.capabilities().await.unwrap_or_else(|| json!({})),
        };

        close_session(&self.tag(), session).await;

        Ok(ConnectionResult {
            tools,
            resources,
            capabilities,
        })
    }

    /// Open a session, call one tool, close the session. Failures propagate.
    async fn call_tool(
        &self,
        address: &str,
        tool_name: &str,
        arguments: serde_json::Value,
        headers: &Headers,
    ) -> Result<ToolCallResult, ConnectionError> {
        let operation = Operation::CallTool(tool_name);
        let session = self
            .open_session(address, headers)
            .await
            .map_err(|err| report(&self.tag(), &err, operation))?;

        let outcome = session.call_tool(tool_name, &arguments).await;
        close_session(&self.tag(), session).await;

        outcome.map_err(|err| report(&self.tag(), &err, operation))
    }
}

/// The capabilities `connect` reports in placeholder mode
pub fn placeholder_capabilities() -> serde_json::Value {
    json!({
        "tools": {"listChanged": true},
        "resources": {"subscribe": true, "listChanged": true},
    })
}

/// Run the handshake on a fresh client, shutting it down again if that fails
pub(crate) async fn initialize_session<T: Transport>(
    config: &ClientConfig,
    transport: T,
) -> anyhow::Result<Box<dyn Session>> {
    let client = ClientBuilder::new(&config.client_name, &config.client_version)
        .with_transport(transport)
        .build()?;

    if let Err(err) = client.initialize().await {
        if let Err(close_err) = client.shutdown().await {
            tracing::warn!(error = %close_err, "Failed to close session after a failed handshake");
        }
        return Err(err);
    }

    Ok(Box::new(client))
}

async fn list_tools_or_empty(session: &dyn Session) -> Vec<ToolDescriptor> {
    match session.list_tools().await {
        Ok(tools) => tools.into_iter().map(ToolDescriptor::from).collect(),
        Err(err) => {
            tracing::warn!(error = %format!("{:#}", err), "Error listing tools");
            Vec::new()
        }
    }
}

async fn list_resources_or_empty(session: &dyn Session) -> Vec<ResourceDescriptor> {
    match session.list_resources().await {
        Ok(resources) => resources.into_iter().map(ResourceDescriptor::from).collect(),
        Err(err) => {
            tracing::warn!(error = %format!("{:#}", err), "Error listing resources");
            Vec::new()
        }
    }
}

async fn close_session(tag: &TransportTag, session: Box<dyn Session>) {
    if let Err(err) = session.close().await {
        tracing::warn!(transport = %tag, error = %format!("{:#}", err), "Failed to close MCP session");
    }
}

fn report(tag: &TransportTag, err: &anyhow::Error, operation: Operation<'_>) -> ConnectionError {
    let classified = classify(err, operation);
    tracing::debug!(
        transport = %tag,
        error = %format!("{:#}", err),
        classified = %classified,
        "MCP operation failed"
    );
    classified
}
