//! Handles for server-side processing resources.
//!
//! A handle is nothing but the token string the service issued; there is no
//! client-side state behind it. The two newtypes exist so the type system
//! keeps one-shot tasks and long-lived pipelines apart:
//!
//! * [`TaskHandle`] — a one-off processing unit. Created by
//!   [`crate::client::DtcClient::execute_task`], consumed by a single
//!   submission, reclaimed by the server after completion.
//! * [`PipelineHandle`] — a persistent unit. Created and destroyed
//!   explicitly by the caller and reusable across many submissions.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Access to the raw token of a resource handle.
///
/// Implemented by both handle types so the submission path can work with
/// either; everything else in the API is typed to one or the other.
pub trait Handle {
    /// The opaque token string issued by the service.
    fn token(&self) -> &str;
}

macro_rules! handle_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a token string received from the service.
            pub fn new(token: impl Into<String>) -> Self {
                Self(token.into())
            }
        }

        impl Handle for $name {
            fn token(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

handle_type! {
    /// Token for a one-shot processing task.
    TaskHandle
}

handle_type! {
    /// Token for a persistent, caller-managed pipeline.
    PipelineHandle
}

// ── Task status ──────────────────────────────────────────────────────────

/// Lifecycle states reported by `GET /task`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Accepted but not yet running. Unknown states map here too.
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

// Deserialized by hand so an unrecognised state degrades to Pending
// instead of failing the whole status poll.
impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "running" => TaskStatus::Running,
            "completed" => TaskStatus::Completed,
            "failed" => TaskStatus::Failed,
            "cancelled" => TaskStatus::Cancelled,
            _ => TaskStatus::Pending,
        })
    }
}

impl TaskStatus {
    /// Whether the task can make no further progress.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// Snapshot of a task's state as reported by the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskInfo {
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub name: Option<String>,
    /// Completion fraction in `[0, 1]` when the service reports one.
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    /// Raw result payload, if the task produced one.
    #[serde(default)]
    pub result: Option<Value>,
}

/// One entry from `GET /services`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub endpoints: Option<Vec<String>>,
}

// ── Pipeline specification ───────────────────────────────────────────────

/// An opaque processing-graph configuration.
///
/// The service interprets the graph; the client only carries it. Build one
/// from any JSON value, or use [`PipelineSpec::webhook_parser`] for the
/// stock webhook → parse → response graph that powers document submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineSpec(Value);

impl PipelineSpec {
    /// Wrap a caller-assembled configuration graph.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// The stock document-parsing graph: a webhook source feeding the parser,
    /// with both the parsed text and the raw webhook lane wired into the
    /// response component.
    pub fn webhook_parser(id: &str) -> Self {
        Self(json!({
            "pipeline": {
                "source": "webhook_1",
                "id": id,
                "components": [
                    {
                        "id": "webhook_1",
                        "provider": "webhook",
                        "config": { "hideForm": true, "mode": "Source", "type": "webhook" }
                    },
                    {
                        "id": "parse_1",
                        "provider": "parse",
                        "config": {},
                        "input": [ { "lane": "tags", "from": "webhook_1" } ]
                    },
                    {
                        "id": "response_1",
                        "provider": "response",
                        "config": { "lanes": [] },
                        "input": [
                            { "lane": "text", "from": "parse_1" },
                            { "lane": "text", "from": "webhook_1" }
                        ]
                    }
                ]
            }
        }))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}
