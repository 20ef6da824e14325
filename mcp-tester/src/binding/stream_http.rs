// mcp-tester/src/binding/stream_http.rs
use anyhow::Result;
use async_trait::async_trait;
use mcp_client::StreamableHttpTransport;

use super::{initialize_session, Session, TransportBinding};
use crate::config::{CapabilitiesReport, ClientConfig};
use crate::types::{Headers, TransportTag};

pub(crate) const HTTP_SCHEMES: &[&str] = &["http://", "https://"];

pub(crate) fn is_http_address(address: &str) -> bool {
    HTTP_SCHEMES.iter().any(|scheme| address.starts_with(scheme))
}

/// Streamable HTTP: every message is POSTed to the address, responses come
/// back as JSON or as an event stream.
#[derive(Debug, Clone, Default)]
pub struct StreamHttpBinding {
    config: ClientConfig,
}

impl StreamHttpBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TransportBinding for StreamHttpBinding {
    fn tag(&self) -> TransportTag {
        TransportTag::STREAM_HTTP
    }

    fn supports_protocol(&self, address: &str) -> bool {
        is_http_address(address)
    }

    async fn open_session(&self, address: &str, headers: &Headers) -> Result<Box<dyn Session>> {
        let transport = StreamableHttpTransport::new(address, headers)?;
        initialize_session(&self.config, transport).await
    }

    fn capabilities_report(&self) -> CapabilitiesReport {
        self.config.capabilities
    }
}
