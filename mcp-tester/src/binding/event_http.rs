// mcp-tester/src/binding/event_http.rs
use anyhow::Result;
use async_trait::async_trait;
use mcp_client::SseTransport;

use super::stream_http::is_http_address;
use super::{initialize_session, Session, TransportBinding};
use crate::config::{CapabilitiesReport, ClientConfig};
use crate::types::{Headers, TransportTag};

/// Legacy HTTP+SSE: a long-lived event stream carries responses, requests
/// are POSTed to the endpoint the stream announces.
#[derive(Debug, Clone, Default)]
pub struct EventHttpBinding {
    config: ClientConfig,
}

impl EventHttpBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TransportBinding for EventHttpBinding {
    fn tag(&self) -> TransportTag {
        TransportTag::EVENT_HTTP
    }

    fn supports_protocol(&self, address: &str) -> bool {
        is_http_address(address)
    }

    async fn open_session(&self, address: &str, headers: &Headers) -> Result<Box<dyn Session>> {
        let transport = SseTransport::new(address, headers)?;
        initialize_session(&self.config, transport).await
    }

    fn capabilities_report(&self) -> CapabilitiesReport {
        self.config.capabilities
    }
}
