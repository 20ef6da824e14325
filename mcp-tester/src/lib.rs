// mcp-tester/src/lib.rs
//! Connect to MCP servers and invoke their tools for testing.
//!
//! An [`Endpoint`] names a server address, the transport used to reach it
//! and the headers to send. The [`ConnectionManager`] resolves the transport
//! binding for an endpoint and delegates to it; every call opens a fresh
//! session and closes it before returning.
//!
//! ```text
//! Relay ──▶ ConnectionManager ──▶ TransportRegistry ──▶ TransportBinding
//!                                                        ├─ ProcessBinding    (proc://, stdio://)
//!                                                        ├─ StreamHttpBinding (http(s)://, tag streamHttp)
//!                                                        └─ EventHttpBinding  (http(s)://, tag eventHttp)
//! ```
//!
//! Failures are mapped into [`ConnectionError`], whose `Display` text is
//! the message shown to the user.

pub mod binding;
pub mod config;
pub mod error;
pub mod manager;
pub mod record;
pub mod registry;
pub mod relay;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use binding::{
    EventHttpBinding, ProcessBinding, Session, StreamHttpBinding, TransportBinding,
};
pub use config::{CapabilitiesReport, ClientConfig, RelayConfig};
pub use error::{classify, ConnectionError, Operation};
pub use manager::ConnectionManager;
pub use record::{RecordError, ServerRecord};
pub use registry::TransportRegistry;
pub use relay::{CallToolRequest, ConnectRequest, Relay, RelayResponse};
pub use types::{
    ConnectionResult, Endpoint, Headers, ResourceDescriptor, ToolCallResult, ToolDescriptor,
    TransportTag,
};
