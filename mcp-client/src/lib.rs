// mcp-client/src/lib.rs
pub mod client;
pub mod error;
pub mod transport;

pub use client::{Client, ClientBuilder};
pub use error::RpcError;
pub use transport::{SseTransport, StdioTransport, StreamableHttpTransport, Transport};

pub use mcp_protocol;
