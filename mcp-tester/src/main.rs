// mcp-tester/src/main.rs
//! Command-line front end: connect to an MCP server or call one of its tools
//! and print the relay response as JSON.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use mcp_tester::{
    CallToolRequest, CapabilitiesReport, ClientConfig, ConnectRequest, ConnectionManager, Headers, Relay,
    RelayConfig, TransportTag,
};

/// Connect to MCP servers and call their tools
#[derive(Parser)]
#[command(name = "mcp-tester")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Give up on a call after this many seconds
    #[arg(long, global = true, env = "MCP_TESTER_TIMEOUT_SECS", default_value_t = 60)]
    timeout_secs: u64,

    /// Report the capabilities the server advertised instead of the fixed placeholder
    #[arg(long, global = true)]
    report_capabilities: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tools and resources of a server
    Connect {
        /// Server URL, or proc://<command> [args...] for a local server
        url: String,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Call one tool on a server
    Call {
        /// Server URL, or proc://<command> [args...] for a local server
        url: String,

        /// Name of the tool to call
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long, value_parser = parse_arguments)]
        args: Option<serde_json::Value>,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// List the registered transports
    Transports,
}

#[derive(Args)]
struct TargetArgs {
    /// Transport to use (process, streamHttp, eventHttp); inferred from the URL when omitted
    #[arg(short, long)]
    transport: Option<TransportTag>,

    /// Header sent with every HTTP request, as KEY=VALUE (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,
}

impl TargetArgs {
    fn headers(&self) -> Option<Headers> {
        if self.headers.is_empty() {
            None
        } else {
            Some(self.headers.iter().cloned().collect())
        }
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header name missing in '{}'", raw));
    }
    Ok((name.to_string(), value.to_string()))
}

fn parse_arguments(raw: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(raw).map_err(|err| format!("invalid JSON: {}", err))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let report = if cli.report_capabilities {
        CapabilitiesReport::Reported
    } else {
        CapabilitiesReport::Placeholder
    };
    let manager = Arc::new(ConnectionManager::new(
        ClientConfig::default().with_capabilities_report(report),
    ));

    let response = match cli.command {
        Commands::Connect { url, target } => {
            let relay = relay(manager, cli.timeout_secs);
            relay
                .connect(ConnectRequest {
                    url: Some(url),
                    transport_type: target.transport.clone(),
                    headers: target.headers(),
                })
                .await
        }
        Commands::Call {
            url,
            tool,
            args,
            target,
        } => {
            let relay = relay(manager, cli.timeout_secs);
            relay
                .call_tool(CallToolRequest {
                    url: Some(url),
                    transport_type: target.transport.clone(),
                    headers: target.headers(),
                    tool_name: Some(tool),
                    arguments: args,
                })
                .await
        }
        Commands::Transports => {
            for tag in manager.available_transports().await {
                println!("{}", tag);
            }
            return Ok(ExitCode::SUCCESS);
        }
    };

    let body = serde_json::to_string_pretty(&response.body).context("Failed to render response")?;
    println!("{}", body);

    if response.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::debug!(status = %response.status, "Relay call did not succeed");
        Ok(ExitCode::FAILURE)
    }
}

fn relay(manager: Arc<ConnectionManager>, timeout_secs: u64) -> Relay {
    Relay::new(
        manager,
        RelayConfig::default().with_deadline(Duration::from_secs(timeout_secs)),
    )
}
