// mcp-protocol/src/constants.rs

/// The protocol version the client asks for during initialization
pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// Protocol versions a server may answer with
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

/// JSON-RPC method names
pub mod methods {
    // Lifecycle methods
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const PING: &str = "ping";

    // Tool methods
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";

    // Resource methods
    pub const RESOURCES_LIST: &str = "resources/list";
}

/// JSON-RPC error codes
pub mod error_codes {
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// HTTP header names used by the HTTP transports
pub mod headers {
    pub const SESSION_ID: &str = "Mcp-Session-Id";
    pub const PROTOCOL_VERSION: &str = "MCP-Protocol-Version";
}
