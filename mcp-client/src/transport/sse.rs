// mcp-client/src/transport/sse.rs
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use mcp_protocol::messages::JsonRpcMessage;
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE};
use std::collections::HashMap;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use url::Url;

const ENDPOINT_EVENT: &str = "endpoint";
const MESSAGE_EVENT: &str = "message";

/// Transport implementation for the legacy HTTP+SSE binding.
///
/// A long-lived GET stream delivers server messages. Its first `endpoint`
/// event names the URL that client messages are POSTed to.
#[derive(Debug)]
pub struct SseTransport {
    url: Url,
    headers: HeaderMap,
    client: reqwest::Client,
    endpoint: RwLock<Option<Url>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl SseTransport {
    /// Create a transport for the event stream at `url`; `headers` are attached to every request as given
    pub fn new(url: &str, headers: &HashMap<String, String>) -> Result<Self> {
        let url = Url::parse(url).with_context(|| format!("invalid URL '{}'", url))?;

        Ok(Self {
            url,
            headers: super::header_map(headers)?,
            client: reqwest::Client::new(),
            endpoint: RwLock::new(None),
            reader: Mutex::new(None),
        })
    }

    /// The message endpoint announced by the server, once started
    pub async fn endpoint(&self) -> Option<Url> {
        self.endpoint.read().await.clone()
    }
}

#[async_trait]
impl super::Transport for SseTransport {
    async fn start(&self, message_tx: mpsc::Sender<JsonRpcMessage>) -> Result<()> {
        let response = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "text/event-stream")
            .headers(self.headers.clone())
            .send()
            .await
            .with_context(|| format!("HTTP request to {} failed", self.url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("HTTP error {}: {}", status, body);
        }

        let mut events = Box::pin(response.bytes_stream().eventsource());

        // Wait for the server to tell us where to POST
        let endpoint = loop {
            match events.next().await {
                Some(Ok(event)) if event.event == ENDPOINT_EVENT => {
                    break resolve_endpoint(&self.url, &event.data)?;
                }
                Some(Ok(event)) => {
                    tracing::debug!(event = %event.event, "Ignoring SSE event before endpoint");
                }
                Some(Err(err)) => {
                    return Err(anyhow!("SSE stream from {} failed: {}", self.url, err));
                }
                None => {
                    bail!("SSE stream from {} ended before the server announced its message endpoint", self.url);
                }
            }
        };

        tracing::debug!(%endpoint, "SSE message endpoint discovered");
        *self.endpoint.write().await = Some(endpoint);

        let reader = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                match event {
                    Ok(event) if event.event == MESSAGE_EVENT || event.event.is_empty() => {
                        match serde_json::from_str::<JsonRpcMessage>(&event.data) {
                            Ok(message) => {
                                if !super::forward(&message_tx, message).await {
                                    break;
                                }
                            }
                            Err(err) => {
                                tracing::error!("Failed to parse JSON-RPC message from SSE stream: {}", err);
                            }
                        }
                    }
                    Ok(event) => {
                        tracing::debug!(event = %event.event, "Ignoring SSE event");
                    }
                    Err(err) => {
                        tracing::warn!("SSE stream from MCP server failed: {}", err);
                        break;
                    }
                }
            }
        });
        *self.reader.lock().await = Some(reader);

        Ok(())
    }

    async fn send(&self, message: JsonRpcMessage) -> Result<()> {
        let endpoint = self
            .endpoint
            .read()
            .await
            .clone()
            .ok_or_else(|| anyhow!("SSE transport not started"))?;

        let response = self
            .client
            .post(endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .headers(self.headers.clone())
            .body(serde_json::to_vec(&message)?)
            .send()
            .await
            .with_context(|| format!("HTTP request to {} failed", endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("HTTP error {}: {}", status, body);
        }

        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if let Some(reader) = self.reader.lock().await.take() {
            reader.abort();
        }
        self.endpoint.write().await.take();
        Ok(())
    }
}

impl Drop for SseTransport {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.get_mut().take() {
            reader.abort();
        }
    }
}

/// Resolve the `endpoint` event payload against the stream URL.
///
/// The endpoint must stay on the stream's origin.
fn resolve_endpoint(stream_url: &Url, data: &str) -> Result<Url> {
    let endpoint = stream_url
        .join(data.trim())
        .with_context(|| format!("invalid SSE endpoint '{}'", data))?;

    if endpoint.origin() != stream_url.origin() {
        bail!(
            "SSE endpoint origin does not match connection origin: {}",
            endpoint.origin().ascii_serialization()
        );
    }

    Ok(endpoint)
}
