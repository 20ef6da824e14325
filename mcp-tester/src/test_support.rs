// mcp-tester/src/test_support.rs
//! In-memory bindings and sessions for exercising the session lifecycle.

use anyhow::anyhow;
use async_trait::async_trait;
use mcp_protocol::types::{resource::Resource, tool::Tool};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::binding::{Session, TransportBinding};
use crate::config::CapabilitiesReport;
use crate::types::{Headers, ToolCallResult, ToolContent, TransportTag};

/// What a fake session answers
#[derive(Clone)]
pub(crate) struct FakeSession {
    pub tools_error: Option<String>,
    pub resources_error: Option<String>,
    pub call_error: Option<String>,
    pub capabilities: Option<serde_json::Value>,
    pub call_result: ToolCallResult,
}

impl Default for FakeSession {
    fn default() -> Self {
        Self {
            tools_error: None,
            resources_error: None,
            call_error: None,
            capabilities: None,
            call_result: ToolCallResult {
                content: vec![ToolContent::text("echo")],
                is_error: None,
            },
        }
    }
}

#[derive(Default)]
struct Counters {
    opens: AtomicUsize,
    closes: AtomicUsize,
    last_call: Mutex<Option<(String, serde_json::Value)>>,
}

struct RecordingSession {
    script: FakeSession,
    counters: Arc<Counters>,
}

#[async_trait]
impl Session for RecordingSession {
    async fn list_tools(&self) -> anyhow::Result<Vec<Tool>> {
        if let Some(message) = &self.script.tools_error {
            return Err(anyhow!("{}", message));
        }
        Ok(vec![Tool {
            name: "echo".to_string(),
            description: Some("Echo back the input".to_string()),
            input_schema: json!({"type": "object"}),
            annotations: None,
        }])
    }

    async fn list_resources(&self) -> anyhow::Result<Vec<Resource>> {
        if let Some(message) = &self.script.resources_error {
            return Err(anyhow!("{}", message));
        }
        Ok(vec![Resource {
            uri: "memo://one".to_string(),
            name: Some("one".to_string()),
            description: None,
            mime_type: Some("text/plain".to_string()),
            size: None,
            annotations: None,
        }])
    }

    async fn call_tool(&self, name: &str, arguments: &serde_json::Value) -> anyhow::Result<ToolCallResult> {
        if let Ok(mut last_call) = self.counters.last_call.lock() {
            *last_call = Some((name.to_string(), arguments.clone()));
        }
        if let Some(message) = &self.script.call_error {
            return Err(anyhow!("{}", message));
        }
        Ok(self.script.call_result.clone())
    }

    async fn capabilities(&self) -> Option<serde_json::Value> {
        self.script.capabilities.clone()
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A binding for `fake://` addresses that records session opens and closes
pub(crate) struct FakeBinding {
    tag: TransportTag,
    script: FakeSession,
    open_error: Option<String>,
    hangs: bool,
    report: CapabilitiesReport,
    counters: Arc<Counters>,
}

impl FakeBinding {
    pub fn new(script: FakeSession) -> Self {
        Self {
            tag: TransportTag::new("fake"),
            script,
            open_error: None,
            hangs: false,
            report: CapabilitiesReport::Placeholder,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn failing_open(message: &str) -> Self {
        Self {
            open_error: Some(message.to_string()),
            ..Self::new(FakeSession::default())
        }
    }

    /// Never finish opening a session
    pub fn hanging() -> Self {
        Self {
            hangs: true,
            ..Self::new(FakeSession::default())
        }
    }

    pub fn with_tag(mut self, tag: TransportTag) -> Self {
        self.tag = tag;
        self
    }

    pub fn reporting(mut self, report: CapabilitiesReport) -> Self {
        self.report = report;
        self
    }

    pub fn opens(&self) -> usize {
        self.counters.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<(String, serde_json::Value)> {
        self.counters.last_call.lock().ok()?.clone()
    }
}

#[async_trait]
impl TransportBinding for FakeBinding {
    fn tag(&self) -> TransportTag {
        self.tag.clone()
    }

    fn supports_protocol(&self, address: &str) -> bool {
        address.starts_with("fake://")
    }

    async fn open_session(&self, _address: &str, _headers: &Headers) -> anyhow::Result<Box<dyn Session>> {
        if let Some(message) = &self.open_error {
            return Err(anyhow!("{}", message));
        }
        if self.hangs {
            std::future::pending::<()>().await;
        }
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingSession {
            script: self.script.clone(),
            counters: self.counters.clone(),
        }))
    }

    fn capabilities_report(&self) -> CapabilitiesReport {
        self.report
    }
}
