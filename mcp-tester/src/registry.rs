// mcp-tester/src/registry.rs
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::binding::TransportBinding;
use crate::types::TransportTag;

/// Registered transport bindings, kept in registration order.
///
/// Order matters: scheme inference picks the first binding that accepts an
/// address.
pub struct TransportRegistry {
    bindings: Arc<RwLock<Vec<Arc<dyn TransportBinding>>>>,
}

impl TransportRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::with_bindings(Vec::new())
    }

    /// Create a registry holding `bindings` in the given order
    pub fn with_bindings(bindings: Vec<Arc<dyn TransportBinding>>) -> Self {
        Self {
            bindings: Arc::new(RwLock::new(bindings)),
        }
    }

    /// Register a binding under its own tag.
    ///
    /// A binding already registered under that tag is replaced in place and
    /// returned; otherwise the new binding goes last.
    pub async fn register(&self, binding: Arc<dyn TransportBinding>) -> Option<Arc<dyn TransportBinding>> {
        let tag = binding.tag();
        let mut bindings = self.bindings.write().await;

        match bindings.iter_mut().find(|existing| existing.tag() == tag) {
            Some(existing) => {
                tracing::debug!(transport = %tag, "Replacing transport binding");
                Some(std::mem::replace(existing, binding))
            }
            None => {
                tracing::debug!(transport = %tag, "Registering transport binding");
                bindings.push(binding);
                None
            }
        }
    }

    /// All registered bindings, in registration order
    pub async fn bindings(&self) -> Vec<Arc<dyn TransportBinding>> {
        self.bindings.read().await.clone()
    }

    /// Tags of all registered bindings, in registration order
    pub async fn tags(&self) -> Vec<TransportTag> {
        let bindings = self.bindings.read().await;
        bindings.iter().map(|binding| binding.tag()).collect()
    }

    /// The binding registered under `tag`
    pub async fn get(&self, tag: &TransportTag) -> Option<Arc<dyn TransportBinding>> {
        let bindings = self.bindings.read().await;
        bindings.iter().find(|binding| binding.tag() == *tag).cloned()
    }

    /// The first binding whose `supports_protocol` accepts `address`
    pub async fn infer(&self, address: &str) -> Option<Arc<dyn TransportBinding>> {
        let bindings = self.bindings.read().await;
        bindings
            .iter()
            .find(|binding| binding.supports_protocol(address))
            .cloned()
    }
}

impl Default for TransportRegistry {
    fn default() -> Self {
        Self::new()
    }
}
