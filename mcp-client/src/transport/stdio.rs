// mcp-client/src/transport/stdio.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use mcp_protocol::messages::JsonRpcMessage;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// How long a server gets to exit on its own after stdin is closed
const EXIT_GRACE: Duration = Duration::from_secs(1);

/// Transport implementation that uses stdio to communicate with a child process
#[derive(Debug)]
pub struct StdioTransport {
    command: String,
    args: Vec<String>,
    child: Mutex<Option<Child>>,
    stdin: Mutex<Option<ChildStdin>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl StdioTransport {
    /// Create a new stdio transport with the given command and arguments
    pub fn new(command: &str, args: Vec<String>) -> Self {
        Self {
            command: command.to_string(),
            args,
            child: Mutex::new(None),
            stdin: Mutex::new(None),
            reader: Mutex::new(None),
        }
    }

    /// The executable this transport spawns
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Positional arguments passed to the executable
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl super::Transport for StdioTransport {
    async fn start(&self, message_tx: mpsc::Sender<JsonRpcMessage>) -> Result<()> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn MCP server process '{}'", self.command))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("Failed to get stdout of spawned process"))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("Failed to get stdin of spawned process"))?;

        tracing::debug!(command = %self.command, pid = ?child.id(), "Spawned MCP server process");

        *self.child.lock().await = Some(child);
        *self.stdin.lock().await = Some(stdin);

        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<JsonRpcMessage>(line) {
                            Ok(message) => {
                                if !super::forward(&message_tx, message).await {
                                    break;
                                }
                            }
                            Err(err) => {
                                tracing::error!("Failed to parse JSON-RPC message: {}", err);
                            }
                        }
                    }
                    Ok(None) => {
                        tracing::debug!("MCP server closed stdout");
                        break;
                    }
                    Err(err) => {
                        tracing::error!("Failed to read from MCP server stdout: {}", err);
                        break;
                    }
                }
            }
        });
        *self.reader.lock().await = Some(reader);

        Ok(())
    }

    async fn send(&self, message: JsonRpcMessage) -> Result<()> {
        let mut guard = self.stdin.lock().await;
        let stdin = guard
            .as_mut()
            .ok_or_else(|| anyhow!("Child process not started"))?;

        let serialized = serde_json::to_string(&message)?;
        stdin.write_all(serialized.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;

        Ok(())
    }

    async fn close(&self) -> Result<()> {
        // Close stdin to signal EOF
        drop(self.stdin.lock().await.take());

        let mut outcome = Ok(());
        if let Some(mut child) = self.child.lock().await.take() {
            match tokio::time::timeout(EXIT_GRACE, child.wait()).await {
                Ok(Ok(status)) => {
                    tracing::debug!(command = %self.command, %status, "MCP server process exited");
                }
                _ => {
                    // If it doesn't exit, kill it
                    if let Err(err) = child.kill().await {
                        tracing::warn!(command = %self.command, "Failed to kill MCP server process: {}", err);
                        outcome = Err(err).with_context(|| format!("failed to kill MCP server process '{}'", self.command));
                    }
                }
            }
        }

        // The reader goes away whether or not the process could be reaped
        if let Some(reader) = self.reader.lock().await.take() {
            reader.abort();
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Transport;

    #[tokio::test]
    async fn missing_executable_fails_with_not_found() {
        let transport = StdioTransport::new("definitely-not-an-mcp-server-4821", vec![]);
        let (tx, _rx) = mpsc::channel(1);

        let err = transport.start(tx).await.unwrap_err();
        let io = err.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
        assert!(err.to_string().contains("failed to spawn"));
    }

    #[tokio::test]
    async fn send_before_start_fails() {
        let transport = StdioTransport::new("cat", vec![]);
        let err = transport
            .send(JsonRpcMessage::notification("ping", None))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not started"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn close_kills_a_process_that_ignores_eof_and_stops_reading() {
        let transport = StdioTransport::new("sleep", vec!["30".to_string()]);
        let (tx, mut rx) = mpsc::channel(4);
        transport.start(tx).await.unwrap();

        transport.close().await.unwrap();
        assert!(rx.recv().await.is_none());

        // Closing again finds nothing left to stop
        transport.close().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn echoes_messages_through_cat() {
        let transport = StdioTransport::new("cat", vec![]);
        let (tx, mut rx) = mpsc::channel(4);
        transport.start(tx).await.unwrap();

        transport
            .send(JsonRpcMessage::notification("notifications/initialized", None))
            .await
            .unwrap();

        let echoed = rx.recv().await.unwrap();
        assert_eq!(echoed.method(), Some("notifications/initialized"));

        transport.close().await.unwrap();
        assert!(rx.recv().await.is_none());
    }
}
