// mcp-client/src/client.rs
use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;

use mcp_protocol::{
    constants::{error_codes, methods, PROTOCOL_VERSION},
    messages::{base::id_key, ClientCapabilities, InitializeParams, InitializeResult, JsonRpcMessage},
    types::{
        resource::{Resource, ResourcesListParams, ResourcesListResult},
        tool::{Tool, ToolCallParams, ToolCallResult, ToolsListParams, ToolsListResult},
        ClientInfo,
    },
    version::is_supported_version,
};

use crate::error::RpcError;
use crate::transport::Transport;

/// Size of the channel between the transport and the dispatcher
const MESSAGE_BUFFER: usize = 100;

/// MCP client state
#[derive(Debug, Clone, PartialEq)]
enum ClientState {
    Created,
    Initializing,
    Ready,
    ShuttingDown,
}

type PendingRequests = Arc<RwLock<HashMap<String, oneshot::Sender<Result<JsonRpcMessage>>>>>;

/// MCP client builder
pub struct ClientBuilder {
    name: String,
    version: String,
    transport: Option<Arc<dyn Transport>>,
    capabilities: ClientCapabilities,
}

impl ClientBuilder {
    /// Create a new client builder
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            transport: None,
            capabilities: ClientCapabilities::default(),
        }
    }

    /// Set the transport to use
    pub fn with_transport<T: Transport>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Override the capabilities advertised during initialization
    pub fn with_capabilities(mut self, capabilities: ClientCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<Client> {
        let transport = self
            .transport
            .ok_or_else(|| anyhow!("Transport is required"))?;

        Ok(Client {
            info: ClientInfo::new(&self.name, &self.version),
            transport,
            capabilities: self.capabilities,
            state: RwLock::new(ClientState::Created),
            next_id: Mutex::new(1),
            pending_requests: Arc::new(RwLock::new(HashMap::new())),
            initialized_result: RwLock::new(None),
            dispatcher: Mutex::new(None),
        })
    }
}

/// MCP client
pub struct Client {
    info: ClientInfo,
    transport: Arc<dyn Transport>,
    capabilities: ClientCapabilities,
    state: RwLock<ClientState>,
    next_id: Mutex<i64>,
    pending_requests: PendingRequests,
    initialized_result: RwLock<Option<InitializeResult>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl Client {
    /// Start the transport and perform the initialize handshake
    pub async fn initialize(&self) -> Result<InitializeResult> {
        {
            let mut state = self.state.write().await;
            if *state != ClientState::Created {
                return Err(anyhow!("Client already initialized"));
            }
            *state = ClientState::Initializing;
        }

        let (message_tx, message_rx) = mpsc::channel(MESSAGE_BUFFER);
        self.transport.start(message_tx).await?;
        *self.dispatcher.lock().await = Some(tokio::spawn(dispatch(
            message_rx,
            self.pending_requests.clone(),
            self.transport.clone(),
        )));

        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: self.capabilities.clone(),
            client_info: self.info.clone(),
        };
        let result: InitializeResult = self
            .request(methods::INITIALIZE, Some(json!(params)))
            .await?;

        if !is_supported_version(&result.protocol_version) {
            tracing::warn!(
                server = %result.server_info.name,
                version = %result.protocol_version,
                "Server answered with an unsupported protocol version"
            );
        }

        self.transport
            .send(JsonRpcMessage::notification(methods::INITIALIZED, None))
            .await?;

        *self.initialized_result.write().await = Some(result.clone());
        *self.state.write().await = ClientState::Ready;

        tracing::debug!(
            server = %result.server_info.name,
            version = %result.server_info.version,
            "MCP session initialized"
        );

        Ok(result)
    }

    /// The initialize result, once the handshake has completed
    pub async fn initialize_result(&self) -> Option<InitializeResult> {
        self.initialized_result.read().await.clone()
    }

    /// Capabilities the server advertised during initialization, as raw JSON
    pub async fn server_capabilities(&self) -> Option<serde_json::Value> {
        let initialized = self.initialized_result.read().await;
        initialized
            .as_ref()
            .and_then(|result| serde_json::to_value(&result.capabilities).ok())
    }

    /// List available tools, following pagination cursors
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        self.ensure_ready().await?;

        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen = HashSet::new();
        loop {
            let params = cursor
                .take()
                .map(|cursor| json!(ToolsListParams { cursor: Some(cursor) }));
            let page: ToolsListResult = self.request(methods::TOOLS_LIST, params).await?;
            tools.extend(page.tools);

            match page.next_cursor {
                Some(next) if seen.insert(next.clone()) => cursor = Some(next),
                _ => break,
            }
        }

        Ok(tools)
    }

    /// List available resources, following pagination cursors
    pub async fn list_resources(&self) -> Result<Vec<Resource>> {
        self.ensure_ready().await?;

        let mut resources = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen = HashSet::new();
        loop {
            let params = cursor
                .take()
                .map(|cursor| json!(ResourcesListParams { cursor: Some(cursor) }));
            let page: ResourcesListResult = self.request(methods::RESOURCES_LIST, params).await?;
            resources.extend(page.resources);

            match page.next_cursor {
                Some(next) if seen.insert(next.clone()) => cursor = Some(next),
                _ => break,
            }
        }

        Ok(resources)
    }

    /// Call a tool on the server
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: &serde_json::Value,
    ) -> Result<ToolCallResult> {
        self.ensure_ready().await?;

        let params = ToolCallParams {
            name: name.to_string(),
            arguments: arguments.clone(),
        };
        self.request(methods::TOOLS_CALL, Some(json!(params))).await
    }

    /// Shutdown the client.
    ///
    /// Safe to call in any state, including after a failed `initialize`.
    /// Calling it twice is a no-op.
    pub async fn shutdown(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if *state == ClientState::ShuttingDown {
                return Ok(());
            }
            *state = ClientState::ShuttingDown;
        }

        let closed = self.transport.close().await;

        if let Some(dispatcher) = self.dispatcher.lock().await.take() {
            dispatcher.abort();
        }
        fail_pending(&self.pending_requests, "Client shut down").await;

        closed
    }

    /// Get the next request ID
    async fn next_request_id(&self) -> i64 {
        let mut id = self.next_id.lock().await;
        let current = *id;
        *id += 1;
        current
    }

    async fn ensure_ready(&self) -> Result<()> {
        let state = self.state.read().await;
        if *state != ClientState::Ready {
            return Err(anyhow!("Client not initialized"));
        }
        Ok(())
    }

    /// Send a request and decode its result
    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<T> {
        match self.send_request(method, params).await? {
            JsonRpcMessage::Response { error: Some(error), .. } => {
                Err(RpcError::new(method, error).into())
            }
            JsonRpcMessage::Response { result: Some(result), .. } => {
                Ok(serde_json::from_value(result)?)
            }
            JsonRpcMessage::Response { .. } => Err(anyhow!("Invalid {} response", method)),
            _ => Err(anyhow!("Invalid response type")),
        }
    }

    /// Send a request and wait for a response
    async fn send_request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<JsonRpcMessage> {
        let id = self.next_request_id().await.to_string();
        let request = JsonRpcMessage::request(id.clone().into(), method, params);

        let (tx, rx) = oneshot::channel();
        self.pending_requests.write().await.insert(id.clone(), tx);

        if let Err(err) = self.transport.send(request).await {
            self.pending_requests.write().await.remove(&id);
            return Err(err);
        }

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(anyhow!("Connection closed before a response to {} arrived", method)),
        }
    }
}

/// Route incoming messages to the requests waiting for them
async fn dispatch(
    mut message_rx: mpsc::Receiver<JsonRpcMessage>,
    pending_requests: PendingRequests,
    transport: Arc<dyn Transport>,
) {
    while let Some(message) = message_rx.recv().await {
        match &message {
            JsonRpcMessage::Response { id, .. } => {
                let Some(key) = id_key(id) else {
                    tracing::warn!("Dropping response with invalid id: {}", id);
                    continue;
                };
                match pending_requests.write().await.remove(&key) {
                    Some(waiter) => {
                        let _ = waiter.send(Ok(message));
                    }
                    None => tracing::debug!("No pending request for ID: {}", key),
                }
            }
            JsonRpcMessage::Notification { method, .. } => {
                tracing::debug!("Received notification: {}", method);
            }
            JsonRpcMessage::Request { id, method, .. } => {
                let reply = if method == methods::PING {
                    JsonRpcMessage::response(id.clone(), json!({}))
                } else {
                    tracing::debug!("Unhandled server request: {}", method);
                    JsonRpcMessage::error(
                        id.clone(),
                        error_codes::METHOD_NOT_FOUND,
                        &format!("Method not supported by client: {}", method),
                        None,
                    )
                };
                if let Err(err) = transport.send(reply).await {
                    tracing::warn!("Failed to answer server request {}: {}", method, err);
                }
            }
        }
    }

    // The transport is gone; nobody will answer what is still waiting
    fail_pending(&pending_requests, "Connection closed by MCP server").await;
}

async fn fail_pending(pending_requests: &PendingRequests, reason: &str) {
    for (_, waiter) in pending_requests.write().await.drain() {
        let _ = waiter.send(Err(anyhow!("{}", reason)));
    }
}
