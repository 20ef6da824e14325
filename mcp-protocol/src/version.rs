// mcp-protocol/src/version.rs
use serde::{Deserialize, Serialize};

use crate::constants::SUPPORTED_PROTOCOL_VERSIONS;

/// Error returned when protocol versions don't match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionMismatchError {
    pub supported: Vec<String>,
    pub requested: String,
}

/// Check if a protocol version is supported
pub fn is_supported_version(version: &str) -> bool {
    SUPPORTED_PROTOCOL_VERSIONS.contains(&version)
}

/// Get information for a version mismatch error
pub fn version_mismatch_error(requested: &str) -> VersionMismatchError {
    VersionMismatchError {
        supported: SUPPORTED_PROTOCOL_VERSIONS
            .iter()
            .map(|v| v.to_string())
            .collect(),
        requested: requested.to_string(),
    }
}
