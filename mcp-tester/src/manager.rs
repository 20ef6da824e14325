// mcp-tester/src/manager.rs
use std::sync::Arc;

use crate::binding::{EventHttpBinding, ProcessBinding, StreamHttpBinding, TransportBinding};
use crate::config::ClientConfig;
use crate::error::ConnectionError;
use crate::registry::TransportRegistry;
use crate::types::{ConnectionResult, Endpoint, ToolCallResult, TransportTag};

/// Entry point for connecting to servers and calling their tools.
///
/// Holds no per-call state: each call resolves a binding once and delegates
/// to it without retrying.
pub struct ConnectionManager {
    registry: TransportRegistry,
}

impl ConnectionManager {
    /// Create a manager with the built-in bindings registered in the order
    /// process, streamHttp, eventHttp
    pub fn new(config: ClientConfig) -> Self {
        let bindings: Vec<Arc<dyn TransportBinding>> = vec![
            Arc::new(ProcessBinding::with_config(config.clone())),
            Arc::new(StreamHttpBinding::with_config(config.clone())),
            Arc::new(EventHttpBinding::with_config(config)),
        ];
        Self {
            registry: TransportRegistry::with_bindings(bindings),
        }
    }

    /// Create a manager with no bindings registered
    pub fn empty() -> Self {
        Self {
            registry: TransportRegistry::new(),
        }
    }

    /// Register an additional binding, replacing any binding with the same tag
    pub async fn register_transport(&self, binding: Arc<dyn TransportBinding>) -> Option<Arc<dyn TransportBinding>> {
        let tag = binding.tag();
        let replaced = self.registry.register(binding).await;
        tracing::info!(transport = %tag, replaced = replaced.is_some(), "Registered transport binding");
        replaced
    }

    /// Tags of the registered bindings
    pub async fn available_transports(&self) -> Vec<TransportTag> {
        self.registry.tags().await
    }

    /// The binding registered under `tag`
    pub async fn get_transport(&self, tag: &TransportTag) -> Result<Arc<dyn TransportBinding>, ConnectionError> {
        self.registry
            .get(tag)
            .await
            .ok_or_else(|| ConnectionError::UnsupportedTransport(tag.clone()))
    }

    /// The binding inferred from the scheme of `address`.
    ///
    /// `http://` and `https://` always resolve to streamHttp while the
    /// built-ins are registered; eventHttp is reachable only by tag.
    pub async fn transport_for_address(&self, address: &str) -> Result<Arc<dyn TransportBinding>, ConnectionError> {
        let binding = self
            .registry
            .infer(address)
            .await
            .ok_or_else(|| ConnectionError::UnsupportedProtocol(address.to_string()))?;
        tracing::debug!(address, transport = %binding.tag(), "Inferred transport from address");
        Ok(binding)
    }

    /// The binding for an endpoint: its explicit transport if set, otherwise inferred
    pub async fn resolve(&self, endpoint: &Endpoint) -> Result<Arc<dyn TransportBinding>, ConnectionError> {
        match &endpoint.transport {
            Some(tag) => self.get_transport(tag).await,
            None => self.transport_for_address(&endpoint.address).await,
        }
    }

    /// List the tools and resources of the server at `endpoint`
    pub async fn connect(&self, endpoint: &Endpoint) -> Result<ConnectionResult, ConnectionError> {
        let outcome = match self.resolve(endpoint).await {
            Ok(binding) => binding.connect(&endpoint.address, &endpoint.headers).await,
            Err(err) => Err(err),
        };

        if let Err(err) = &outcome {
            tracing::error!(address = %endpoint.address, error = %err, "Error connecting to MCP server");
        }
        outcome
    }

    /// Call one tool on the server at `endpoint`
    pub async fn call_tool(
        &self,
        endpoint: &Endpoint,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolCallResult, ConnectionError> {
        let outcome = match self.resolve(endpoint).await {
            Ok(binding) => {
                binding
                    .call_tool(&endpoint.address, tool_name, arguments, &endpoint.headers)
                    .await
            }
            Err(err) => Err(err),
        };

        if let Err(err) = &outcome {
            tracing::error!(
                address = %endpoint.address,
                tool = tool_name,
                error = %err,
                "Error calling tool on MCP server"
            );
        }
        outcome
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}
