// mcp-protocol/src/types/implementation.rs
use serde::{Deserialize, Serialize};

/// Name and version of an MCP client or server, exchanged during `initialize`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,

    /// Display name, sent by newer peers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Implementation {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            title: None,
        }
    }
}

/// The client's identity in the `initialize` request
pub type ClientInfo = Implementation;

/// The server's identity in the `initialize` result
pub type ServerInfo = Implementation;
