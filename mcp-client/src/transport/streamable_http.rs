// mcp-client/src/transport/streamable_http.rs
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use mcp_protocol::constants::headers::{PROTOCOL_VERSION, SESSION_ID};
use mcp_protocol::constants::{error_codes, methods};
use mcp_protocol::messages::{base::id_key, JsonRpcMessage};
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use url::Url;

/// Transport implementation for the streamable HTTP binding.
///
/// Every outgoing message is its own POST. The server answers either with a
/// JSON body (one message or a batch) or with an event stream that carries
/// the response, so both are parsed and fed into the message channel.
/// A request whose response never arrives is answered with an error
/// instead of being left pending.
#[derive(Debug)]
pub struct StreamableHttpTransport {
    url: Url,
    headers: HeaderMap,
    client: reqwest::Client,
    session_id: RwLock<Option<String>>,
    protocol_version: Arc<RwLock<Option<String>>>,
    message_tx: Mutex<Option<mpsc::Sender<JsonRpcMessage>>>,
    readers: Mutex<Vec<JoinHandle<()>>>,
}

impl StreamableHttpTransport {
    /// Create a transport for `url`; `headers` are attached to every request as given
    pub fn new(url: &str, headers: &HashMap<String, String>) -> Result<Self> {
        let url = Url::parse(url).with_context(|| format!("invalid URL '{}'", url))?;

        Ok(Self {
            url,
            headers: super::header_map(headers)?,
            client: reqwest::Client::new(),
            session_id: RwLock::new(None),
            protocol_version: Arc::new(RwLock::new(None)),
            message_tx: Mutex::new(None),
            readers: Mutex::new(Vec::new()),
        })
    }

    /// The session id assigned by the server, if any
    pub async fn session_id(&self) -> Option<String> {
        self.session_id.read().await.clone()
    }

    async fn sender(&self) -> Result<mpsc::Sender<JsonRpcMessage>> {
        self.message_tx
            .lock()
            .await
            .clone()
            .ok_or_else(|| anyhow!("Streamable HTTP transport not started"))
    }

    async fn remember_session(&self, response: &reqwest::Response) {
        let Some(value) = response.headers().get(SESSION_ID) else {
            return;
        };
        match value.to_str() {
            Ok(id) => {
                let mut session_id = self.session_id.write().await;
                if session_id.as_deref() != Some(id) {
                    tracing::debug!(session_id = %id, "Streamable HTTP session established");
                    *session_id = Some(id.to_string());
                }
            }
            Err(err) => tracing::warn!("Ignoring non-ASCII session id header: {}", err),
        }
    }
}

#[async_trait]
impl super::Transport for StreamableHttpTransport {
    async fn start(&self, message_tx: mpsc::Sender<JsonRpcMessage>) -> Result<()> {
        *self.message_tx.lock().await = Some(message_tx);
        Ok(())
    }

    async fn send(&self, message: JsonRpcMessage) -> Result<()> {
        let message_tx = self.sender().await?;
        let body = serde_json::to_vec(&message)?;
        let awaiting = AwaitedResponse::for_message(&message);

        let mut request = self
            .client
            .post(self.url.clone())
            .header(ACCEPT, "application/json, text/event-stream")
            .header(CONTENT_TYPE, "application/json");
        if let Some(session_id) = self.session_id.read().await.as_deref() {
            request = request.header(SESSION_ID, session_id);
        }
        if let Some(version) = self.protocol_version.read().await.as_deref() {
            request = request.header(PROTOCOL_VERSION, version);
        }
        let response = request
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await
            .with_context(|| format!("HTTP request to {} failed", self.url))?;

        self.remember_session(&response).await;

        let status = response.status();
        if status == StatusCode::ACCEPTED {
            if let Some(awaiting) = &awaiting {
                bail!("Server accepted {} request {} without answering it", awaiting.method, awaiting.key);
            }
            return Ok(());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("HTTP error {}: {}", status, body);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("text/event-stream") {
            let mut events = Box::pin(response.bytes_stream().eventsource());
            let protocol_version = self.protocol_version.clone();
            let reader = tokio::spawn(async move {
                let mut answered = false;
                while let Some(event) = events.next().await {
                    match event {
                        Ok(event) if event.data.trim().is_empty() => {}
                        Ok(event) => match serde_json::from_str::<JsonRpcMessage>(&event.data) {
                            Ok(message) => {
                                if let Some(awaiting) = &awaiting {
                                    if awaiting.is_answered_by(&message) {
                                        answered = true;
                                        awaiting.remember_protocol_version(&message, &protocol_version).await;
                                    }
                                }
                                if !super::forward(&message_tx, message).await {
                                    break;
                                }
                            }
                            Err(err) => {
                                tracing::error!("Failed to parse JSON-RPC message from event stream: {}", err);
                            }
                        },
                        Err(err) => {
                            tracing::warn!("Event stream from MCP server failed: {}", err);
                            break;
                        }
                    }
                }

                if let Some(awaiting) = awaiting.filter(|_| !answered) {
                    tracing::warn!(
                        method = %awaiting.method,
                        id = %awaiting.key,
                        "Event stream closed before a response arrived"
                    );
                    super::forward(&message_tx, awaiting.stream_closed()).await;
                }
            });

            let mut readers = self.readers.lock().await;
            readers.retain(|handle| !handle.is_finished());
            readers.push(reader);
            return Ok(());
        }

        let body = response
            .bytes()
            .await
            .context("failed to read HTTP response body")?;
        let mut answered = false;
        for message in parse_json_body(&body)? {
            if let Some(awaiting) = &awaiting {
                if awaiting.is_answered_by(&message) {
                    answered = true;
                    awaiting.remember_protocol_version(&message, &self.protocol_version).await;
                }
            }
            super::forward(&message_tx, message).await;
        }

        match awaiting {
            Some(awaiting) if !answered => bail!(
                "HTTP response to {} request {} carried no JSON-RPC response",
                awaiting.method,
                awaiting.key
            ),
            _ => Ok(()),
        }
    }

    async fn close(&self) -> Result<()> {
        for reader in self.readers.lock().await.drain(..) {
            reader.abort();
        }
        self.message_tx.lock().await.take();

        // Terminate the server-side session; servers may refuse with 405, which is fine
        if let Some(session_id) = self.session_id.write().await.take() {
            let result = self
                .client
                .delete(self.url.clone())
                .headers(self.headers.clone())
                .header(SESSION_ID, &session_id)
                .send()
                .await;
            match result {
                Ok(response) => {
                    tracing::debug!(%session_id, status = %response.status(), "Terminated streamable HTTP session");
                }
                Err(err) => {
                    tracing::debug!(%session_id, "Failed to terminate streamable HTTP session: {}", err);
                }
            }
        }

        Ok(())
    }
}

impl Drop for StreamableHttpTransport {
    fn drop(&mut self) {
        for reader in self.readers.get_mut().drain(..) {
            reader.abort();
        }
    }
}

/// The response an outgoing request expects
#[derive(Debug)]
struct AwaitedResponse {
    id: serde_json::Value,
    key: String,
    method: String,
}

impl AwaitedResponse {
    fn for_message(message: &JsonRpcMessage) -> Option<Self> {
        match message {
            JsonRpcMessage::Request { id, method, .. } => Some(Self {
                id: id.clone(),
                key: id_key(id)?,
                method: method.clone(),
            }),
            _ => None,
        }
    }

    fn is_answered_by(&self, message: &JsonRpcMessage) -> bool {
        match message {
            JsonRpcMessage::Response { id, .. } => id_key(id).as_deref() == Some(self.key.as_str()),
            _ => false,
        }
    }

    /// The error handed to the waiting caller when the stream ends unanswered
    fn stream_closed(&self) -> JsonRpcMessage {
        JsonRpcMessage::error(
            self.id.clone(),
            error_codes::INTERNAL_ERROR,
            "Event stream closed before a response arrived",
            None,
        )
    }

    /// Keep the version negotiated by `initialize` for later requests
    async fn remember_protocol_version(&self, message: &JsonRpcMessage, slot: &RwLock<Option<String>>) {
        if self.method != methods::INITIALIZE {
            return;
        }
        if let JsonRpcMessage::Response { result: Some(result), .. } = message {
            if let Some(version) = result.get("protocolVersion").and_then(|v| v.as_str()) {
                *slot.write().await = Some(version.to_string());
            }
        }
    }
}

/// Parse a JSON response body holding either one message or a batch
fn parse_json_body(body: &[u8]) -> Result<Vec<JsonRpcMessage>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let value: serde_json::Value =
        serde_json::from_slice(body).context("HTTP response body is not JSON")?;
    let messages = match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<JsonRpcMessage>, _>>()?,
        single => vec![serde_json::from_value(single)?],
    };
    Ok(messages)
}
