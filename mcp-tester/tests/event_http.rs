//! The legacy HTTP+SSE binding against a small in-process SSE server.

use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Mutex};

use mcp_tester::{ConnectionError, ConnectionManager, Endpoint, TransportTag};

const API_KEY: &str = "k1";

/// What the server saw, for assertions
#[derive(Default)]
struct Seen {
    streams: usize,
    methods: Vec<String>,
}

/// Serves `GET /sse` as an event stream announcing `/messages`, and answers
/// every `POST /messages` on the open stream
struct SseServer {
    addr: SocketAddr,
    seen: Arc<Mutex<Seen>>,
}

impl SseServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (events, _) = broadcast::channel::<String>(16);
        let seen = Arc::new(Mutex::new(Seen::default()));

        let state = seen.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(serve(socket, events.clone(), state.clone()));
            }
        });

        Self { addr, seen }
    }

    fn url(&self) -> String {
        format!("http://{}/sse", self.addr)
    }
}

struct HttpRequest {
    method: String,
    path: String,
    api_key: Option<String>,
    body: Vec<u8>,
}

async fn read_request(reader: &mut BufReader<TcpStream>) -> Option<HttpRequest> {
    let mut line = String::new();
    reader.read_line(&mut line).await.ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut content_length = 0;
    let mut api_key = None;
    loop {
        line.clear();
        reader.read_line(&mut line).await.ok()?;
        let header = line.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().ok()?,
                "x-api-key" => api_key = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).await.ok()?;
    Some(HttpRequest {
        method,
        path,
        api_key,
        body,
    })
}

async fn serve(socket: TcpStream, events: broadcast::Sender<String>, seen: Arc<Mutex<Seen>>) {
    let mut reader = BufReader::new(socket);
    let Some(request) = read_request(&mut reader).await else {
        return;
    };
    let mut socket = reader.into_inner();

    if request.api_key.as_deref() != Some(API_KEY) {
        let _ = socket
            .write_all(b"HTTP/1.1 401 Unauthorized\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
            .await;
        return;
    }

    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/sse") => {
            seen.lock().await.streams += 1;
            let mut outgoing = events.subscribe();
            let head = "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n";
            if socket.write_all(head.as_bytes()).await.is_err()
                || socket
                    .write_all(b"event: endpoint\ndata: /messages?sessionId=1\n\n")
                    .await
                    .is_err()
            {
                return;
            }
            while let Ok(message) = outgoing.recv().await {
                let event = format!("event: message\ndata: {}\n\n", message);
                if socket.write_all(event.as_bytes()).await.is_err() || socket.flush().await.is_err() {
                    return;
                }
            }
        }
        ("POST", path) if path.starts_with("/messages") => {
            let message: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
            if let Some(method) = message["method"].as_str() {
                seen.lock().await.methods.push(method.to_string());
            }
            if let Some(reply) = answer(&message) {
                let _ = events.send(reply.to_string());
            }
            let _ = socket
                .write_all(b"HTTP/1.1 202 Accepted\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await;
        }
        _ => {
            let _ = socket
                .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await;
        }
    }
}

fn answer(message: &Value) -> Option<Value> {
    let id = message.get("id")?.clone();
    let result = match message["method"].as_str().unwrap_or_default() {
        "initialize" => json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {"tools": {}, "resources": {}},
            "serverInfo": {"name": "legacy", "version": "0.9.0"}
        }),
        "tools/list" => json!({
            "tools": [{"name": "shout", "inputSchema": {"type": "object"}}]
        }),
        "resources/list" => json!({
            "resources": [{"uri": "memo://legacy", "name": "legacy"}]
        }),
        "tools/call" => {
            let text = message["params"]["arguments"]["text"].as_str().unwrap_or_default();
            json!({"content": [{"type": "text", "text": text.to_uppercase()}]})
        }
        _ => json!({}),
    };
    Some(json!({"jsonrpc": "2.0", "id": id, "result": result}))
}

fn endpoint(server: &SseServer) -> Endpoint {
    Endpoint::new(server.url())
        .with_transport(TransportTag::EVENT_HTTP)
        .with_header("X-Api-Key", API_KEY)
}

#[tokio::test]
async fn connect_lists_tools_and_resources() {
    let server = SseServer::start().await;
    let manager = ConnectionManager::default();

    let result = tokio::time::timeout(Duration::from_secs(5), manager.connect(&endpoint(&server)))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result.tools.len(), 1);
    assert_eq!(result.tools[0].name, "shout");
    assert_eq!(result.resources.len(), 1);
    assert_eq!(result.resources[0].uri, "memo://legacy");

    let seen = server.seen.lock().await;
    assert_eq!(seen.streams, 1);
    assert_eq!(seen.methods[0], "initialize");
    assert_eq!(seen.methods[1], "notifications/initialized");
    assert!(seen.methods.contains(&"tools/list".to_string()));
    assert!(seen.methods.contains(&"resources/list".to_string()));
}

#[tokio::test]
async fn call_tool_round_trip() {
    let server = SseServer::start().await;
    let manager = ConnectionManager::default();

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        manager.call_tool(&endpoint(&server), "shout", json!({"text": "hello"})),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"content": [{"type": "text", "text": "HELLO"}]})
    );
}

#[tokio::test]
async fn missing_headers_fail_the_connection() {
    let server = SseServer::start().await;
    let manager = ConnectionManager::default();
    let endpoint = Endpoint::new(server.url()).with_transport(TransportTag::EVENT_HTTP);

    let err = manager.connect(&endpoint).await.unwrap_err();
    match err {
        ConnectionError::ConnectFailed(message) => assert!(message.contains("HTTP error 401"), "{message}"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(server.seen.lock().await.streams, 0);
}
