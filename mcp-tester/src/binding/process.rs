// mcp-tester/src/binding/process.rs
use anyhow::{bail, Result};
use async_trait::async_trait;
use mcp_client::StdioTransport;

use super::{initialize_session, Session, TransportBinding};
use crate::config::{CapabilitiesReport, ClientConfig};
use crate::types::{Headers, TransportTag};

/// Address prefixes that name a local executable
pub const PROCESS_SCHEMES: &[&str] = &["proc://", "stdio://"];

/// An executable and its arguments, parsed from a process address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub executable: String,
    pub args: Vec<String>,
}

/// Parse `proc://<executable> [arg ...]` into a command.
///
/// The scheme is optional. The remainder is split on whitespace; quoting
/// is not supported.
pub fn parse_process_address(address: &str) -> Result<ProcessCommand> {
    let command_line = PROCESS_SCHEMES
        .iter()
        .find_map(|scheme| address.strip_prefix(scheme))
        .unwrap_or(address);

    let mut parts = command_line.split_whitespace().map(str::to_string);
    let Some(executable) = parts.next() else {
        bail!("No command given in process address '{}'", address);
    };

    Ok(ProcessCommand {
        executable,
        args: parts.collect(),
    })
}

/// Runs the server as a child process and speaks newline-delimited JSON-RPC
/// over its stdin and stdout. Headers are ignored.
#[derive(Debug, Clone, Default)]
pub struct ProcessBinding {
    config: ClientConfig,
}

impl ProcessBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TransportBinding for ProcessBinding {
    fn tag(&self) -> TransportTag {
        TransportTag::PROCESS
    }

    fn supports_protocol(&self, address: &str) -> bool {
        PROCESS_SCHEMES.iter().any(|scheme| address.starts_with(scheme))
    }

    async fn open_session(&self, address: &str, _headers: &Headers) -> Result<Box<dyn Session>> {
        let command = parse_process_address(address)?;
        tracing::debug!(executable = %command.executable, args = ?command.args, "Starting MCP server process");

        let transport = StdioTransport::new(&command.executable, command.args);
        initialize_session(&self.config, transport).await
    }

    fn capabilities_report(&self) -> CapabilitiesReport {
        self.config.capabilities
    }
}
