// mcp-tester/src/config.rs
use std::time::Duration;

/// Client name sent in the `initialize` handshake
pub const DEFAULT_CLIENT_NAME: &str = "mcp-tester-client";

/// Client version sent in the `initialize` handshake
pub const DEFAULT_CLIENT_VERSION: &str = "1.0.0";

/// Deadline applied around each relayed call
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);

/// What `connect` reports as the server's capabilities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CapabilitiesReport {
    /// The fixed shape earlier releases always returned
    #[default]
    Placeholder,
    /// Whatever the server advertised in its `initialize` response
    Reported,
}

/// Settings shared by every transport binding
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_name: String,
    pub client_version: String,
    pub capabilities: CapabilitiesReport,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            client_version: DEFAULT_CLIENT_VERSION.to_string(),
            capabilities: CapabilitiesReport::default(),
        }
    }
}

impl ClientConfig {
    /// Set the client identity used during the handshake
    pub fn with_client_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.client_name = name.into();
        self.client_version = version.into();
        self
    }

    /// Choose how capabilities are reported by `connect`
    pub fn with_capabilities_report(mut self, report: CapabilitiesReport) -> Self {
        self.capabilities = report;
        self
    }
}

/// Settings for the relay boundary
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Upper bound on one relayed `connect` or `call_tool`, session teardown included
    pub deadline: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_DEADLINE,
        }
    }
}

impl RelayConfig {
    /// Set the deadline
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}
