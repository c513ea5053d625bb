//! Session configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::InspectorError;

/// Configuration for an [`InspectorSession`](crate::session::InspectorSession).
///
/// Every field is optional in JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    /// Envelope id carrying the event stream.
    pub stream_id: String,
    /// Method of the stream subscription request.
    pub stream_method: String,
    /// Id of the first outbound command.
    pub first_request_id: u64,
    /// Recursion limit for default value resolution.
    pub max_depth: usize,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            stream_id: "1".to_owned(),
            stream_method: "inspector/stream".to_owned(),
            first_request_id: 10,
            max_depth: nomai_reflect::defaults::DEFAULT_MAX_DEPTH,
        }
    }
}

impl InspectorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, InspectorError> {
        serde_json::from_str(json).map_err(InspectorError::ConfigParse)
    }

    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InspectorError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| InspectorError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}
