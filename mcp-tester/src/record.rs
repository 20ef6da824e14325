// mcp-tester/src/record.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Endpoint, Headers, TransportTag};

/// A saved server as stored by the registry store.
///
/// Only the shape is modelled here; reading and writing records is the
/// store's business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRecord {
    pub id: i32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    #[serde(default = "default_transport")]
    pub transport_type: TransportTag,
    /// Stored as nullable JSON; `null` and a missing field both mean no headers
    #[serde(default)]
    pub headers: Option<Headers>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_transport() -> TransportTag {
    TransportTag::STREAM_HTTP
}

/// Why a record may not be written
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Name and URL are required")]
    MissingField,

    #[error("Invalid transport type. Must be one of: process, streamHttp, eventHttp")]
    InvalidTransport(TransportTag),
}

impl ServerRecord {
    /// A new record stamped with the current time
    pub fn new(id: i32, name: impl Into<String>, url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            description: None,
            url: url.into(),
            transport_type: default_transport(),
            headers: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_transport(mut self, transport: TransportTag) -> Self {
        self.transport_type = transport;
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Check the record before it is written: name and URL must be present
    /// and the transport must be one of the built-in tags
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.name.trim().is_empty() || self.url.trim().is_empty() {
            return Err(RecordError::MissingField);
        }
        if !self.transport_type.is_builtin() {
            return Err(RecordError::InvalidTransport(self.transport_type.clone()));
        }
        Ok(())
    }

    /// The endpoint to reach this server, always with an explicit transport
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(&self.url)
            .with_transport(self.transport_type.clone())
            .with_headers(self.headers.clone().unwrap_or_default())
    }
}
