//! Wire models for the bulk write endpoint.

use serde::{Deserialize, Serialize};

/// A single key/value pair of a bulk write request.
///
/// Bulk requests carry values as strings, so binary values are sent base64
/// encoded with `base64` set, and the store decodes them before persisting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkEntry {
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub base64: bool,
}
impl BulkEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>, base64: bool) -> Self {
        Self { key: key.into(), value: value.into(), base64 }
    }

    /// Bytes this entry contributes to a request body, excluding framing.
    pub fn request_size(&self) -> usize {
        self.key.len() + self.value.len()
    }
}
