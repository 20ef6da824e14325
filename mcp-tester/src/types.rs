// mcp-tester/src/types.rs
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use mcp_protocol::types::{resource::Resource, tool::Tool};

pub use mcp_protocol::types::tool::{ToolCallResult, ToolContent};

/// Headers attached verbatim to every request of an HTTP session
pub type Headers = HashMap<String, String>;

/// Names the transport binding used to reach an endpoint.
///
/// The three built-in tags are associated constants; any other string is a
/// valid tag as long as a binding has been registered for it. The values
/// stored by older registries (`stdio`, `http`, `sse`) parse to the
/// matching built-in tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TransportTag(Cow<'static, str>);

impl TransportTag {
    /// Local executable spoken to over stdin/stdout
    pub const PROCESS: Self = Self(Cow::Borrowed("process"));
    /// Streamable HTTP
    pub const STREAM_HTTP: Self = Self(Cow::Borrowed("streamHttp"));
    /// Legacy HTTP with server-sent events
    pub const EVENT_HTTP: Self = Self(Cow::Borrowed("eventHttp"));

    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        match tag.as_str() {
            "process" | "stdio" => Self::PROCESS,
            "streamHttp" | "http" => Self::STREAM_HTTP,
            "eventHttp" | "sse" => Self::EVENT_HTTP,
            _ => Self(Cow::Owned(tag)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is one of the three tags the manager registers by default
    pub fn is_builtin(&self) -> bool {
        *self == Self::PROCESS || *self == Self::STREAM_HTTP || *self == Self::EVENT_HTTP
    }
}

impl fmt::Display for TransportTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TransportTag {
    fn from(tag: String) -> Self {
        Self::new(tag)
    }
}

impl From<&str> for TransportTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<TransportTag> for String {
    fn from(tag: TransportTag) -> Self {
        tag.0.into_owned()
    }
}

impl FromStr for TransportTag {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

/// A server to reach: its address, the transport to use and the headers to send.
///
/// Built fresh for each request and never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub address: String,

    /// Explicit transport; when absent it is inferred from the address scheme
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportTag>,

    #[serde(default)]
    pub headers: Headers,
}

impl Endpoint {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            transport: None,
            headers: Headers::new(),
        }
    }

    pub fn with_transport(mut self, transport: TransportTag) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers.extend(headers);
        self
    }
}

/// A tool as reported to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_schema: serde_json::Value,
}

impl From<Tool> for ToolDescriptor {
    fn from(tool: Tool) -> Self {
        Self {
            name: tool.name,
            description: tool.description,
            input_schema: tool.input_schema,
        }
    }
}

/// A resource as reported to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl From<Resource> for ResourceDescriptor {
    fn from(resource: Resource) -> Self {
        Self {
            uri: resource.uri,
            name: resource.name,
            description: resource.description,
            mime_type: resource.mime_type,
        }
    }
}

/// What `connect` learned about a server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionResult {
    pub tools: Vec<ToolDescriptor>,
    pub resources: Vec<ResourceDescriptor>,
    pub capabilities: serde_json::Value,
}
