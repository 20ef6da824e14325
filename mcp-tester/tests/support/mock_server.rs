//! Mock MCP server for integration testing.
//!
//! Speaks newline-delimited JSON-RPC over stdin/stdout and exits on EOF.
//!
//! Usage:
//!   mock-mcp-server [--fail-tools] [--fail-resources] [ARGS...]
//!
//! Options:
//!   --fail-tools       Answer tools/list with an internal error
//!   --fail-resources   Answer resources/list with "method not found"
//!
//! Tools:
//!   echo { text }      Returns `text` as text content
//!   add { a, b }       Returns the sum as text content
//!   argv               Returns the command-line arguments, one text item each

use std::env;
use std::io::{BufRead, Write};

use serde_json::{json, Value};

const INVALID_PARAMS: i64 = -32602;
const METHOD_NOT_FOUND: i64 = -32601;
const INTERNAL_ERROR: i64 = -32603;

struct ServerConfig {
    fail_tools: bool,
    fail_resources: bool,
    args: Vec<String>,
}

impl ServerConfig {
    fn from_args() -> Self {
        let args: Vec<String> = env::args().skip(1).collect();
        Self {
            fail_tools: args.iter().any(|arg| arg == "--fail-tools"),
            fail_resources: args.iter().any(|arg| arg == "--fail-resources"),
            args,
        }
    }
}

fn main() {
    let config = ServerConfig::from_args();
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            return;
        };
        let Ok(message) = serde_json::from_str::<Value>(&line) else {
            continue;
        };

        // Notifications carry no id and get no answer
        let Some(id) = message.get("id").cloned() else {
            continue;
        };
        let method = message["method"].as_str().unwrap_or_default();
        let params = message.get("params").cloned().unwrap_or(Value::Null);

        let response = match handle_request(method, &params, &config) {
            Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
            Err((code, text)) => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {"code": code, "message": text}
            }),
        };

        if writeln!(stdout, "{}", response).is_err() || stdout.flush().is_err() {
            return;
        }
    }
}

fn handle_request(method: &str, params: &Value, config: &ServerConfig) -> Result<Value, (i64, String)> {
    match method {
        "initialize" => Ok(json!({
            "protocolVersion": "2025-03-26",
            "capabilities": {
                "tools": {},
                "resources": {}
            },
            "serverInfo": {
                "name": "mock-mcp-server",
                "version": "1.0.0"
            }
        })),
        "tools/list" if config.fail_tools => Err((INTERNAL_ERROR, "tool registry unavailable".to_string())),
        "tools/list" => Ok(json!({
            "tools": [
                {
                    "name": "echo",
                    "description": "Echo back the input",
                    "inputSchema": {
                        "type": "object",
                        "properties": {"text": {"type": "string"}},
                        "required": ["text"]
                    }
                },
                {
                    "name": "add",
                    "description": "Add two numbers",
                    "inputSchema": {
                        "type": "object",
                        "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
                        "required": ["a", "b"]
                    }
                },
                {
                    "name": "argv",
                    "inputSchema": {"type": "object"}
                }
            ]
        })),
        "resources/list" if config.fail_resources => Err((METHOD_NOT_FOUND, "Method not found".to_string())),
        "resources/list" => Ok(json!({
            "resources": [
                {
                    "uri": "memo://greeting",
                    "name": "greeting",
                    "mimeType": "text/plain"
                }
            ]
        })),
        "tools/call" => call_tool(params, config),
        "ping" => Ok(json!({})),
        other => Err((METHOD_NOT_FOUND, format!("Method not found: {}", other))),
    }
}

fn call_tool(params: &Value, config: &ServerConfig) -> Result<Value, (i64, String)> {
    let name = params["name"].as_str().unwrap_or_default();
    let arguments = &params["arguments"];

    match name {
        "echo" => {
            let text = arguments["text"]
                .as_str()
                .ok_or((INVALID_PARAMS, "Invalid arguments: text must be a string".to_string()))?;
            Ok(json!({"content": [{"type": "text", "text": text}]}))
        }
        "add" => {
            let (Some(a), Some(b)) = (arguments["a"].as_f64(), arguments["b"].as_f64()) else {
                return Err((INVALID_PARAMS, "expected numbers for 'a' and 'b'".to_string()));
            };
            Ok(json!({"content": [{"type": "text", "text": (a + b).to_string()}]}))
        }
        "argv" => {
            let content: Vec<Value> = config
                .args
                .iter()
                .map(|arg| json!({"type": "text", "text": arg}))
                .collect();
            Ok(json!({"content": content}))
        }
        other => Err((INVALID_PARAMS, format!("Unknown tool: {}", other))),
    }
}
