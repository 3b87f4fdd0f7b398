//! Flattened processing results.
//!
//! A successful submission answers with a nested `data` payload:
//!
//! ```json
//! {
//!   "objectsRequested": 1,
//!   "objectsCompleted": 1,
//!   "objects": {
//!     "doc-1": {
//!       "text": ["Extracted body text…"],
//!       "metadata": { "author": "…", "pages": 4 }
//!     }
//!   }
//! }
//! ```
//!
//! Callers almost always want "the text and the metadata", not a tree walk,
//! so [`ProcessingResult::from_data`] flattens the first object into plain
//! fields. Extraction is total: absent or empty `objects` yields an empty
//! result, never an error — an empty document is a valid outcome.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Counts reported by the service for one submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub objects_requested: u64,
    pub objects_completed: u64,
}

/// Flattened outcome of one document submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// First text line of the first processed object; empty when the
    /// service returned no objects.
    pub extracted_text: String,
    /// Metadata mapping of the first processed object, values coerced to
    /// strings.
    pub metadata: BTreeMap<String, String>,
    pub stats: ProcessingStats,
}

impl ProcessingResult {
    /// Flatten a `data` payload. Total over any JSON value.
    pub fn from_data(data: &Value) -> Self {
        let stats = ProcessingStats {
            objects_requested: data
                .get("objectsRequested")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            objects_completed: data
                .get("objectsCompleted")
                .and_then(Value::as_u64)
                .unwrap_or(0),
        };

        let first_object = data
            .get("objects")
            .and_then(Value::as_object)
            .and_then(|objects| objects.values().next());

        let extracted_text = first_object
            .and_then(|obj| obj.get("text"))
            .and_then(Value::as_array)
            .and_then(|lines| lines.first())
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_owned();

        let metadata = first_object
            .and_then(|obj| obj.get("metadata"))
            .and_then(Value::as_object)
            .map(|m| {
                m.iter()
                    .map(|(k, v)| (k.clone(), stringify(v)))
                    .collect::<BTreeMap<_, _>>()
            })
            .unwrap_or_default();

        Self {
            extracted_text,
            metadata,
            stats,
        }
    }

    /// True when the service produced neither text nor metadata.
    pub fn is_empty(&self) -> bool {
        self.extracted_text.is_empty() && self.metadata.is_empty()
    }
}

/// Metadata values arrive as strings, numbers, or booleans; render
/// non-strings with their JSON representation.
fn stringify(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
