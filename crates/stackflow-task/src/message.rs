//! Task message and envelope types
//!
//! The inner message is the task invocation itself. It is serialized
//! once at send time and those exact bytes are what gets signed; the
//! outer envelope carries the bytes and the detached signature, because
//! re-serialization is not guaranteed to be byte-identical.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Lifecycle status of a task message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Sent,
    Received,
    Complete,
    #[serde(rename = "Signature Mismatch")]
    SignatureMismatch,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Sent => write!(f, "Sent"),
            TaskStatus::Received => write!(f, "Received"),
            TaskStatus::Complete => write!(f, "Complete"),
            TaskStatus::SignatureMismatch => write!(f, "Signature Mismatch"),
        }
    }
}

/// One asynchronous task invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMessage {
    /// Unique message id (UUID v4)
    pub msg_id: String,

    /// Registry key of the worker to invoke
    pub worker_key: String,

    /// Positional arguments
    pub args: Vec<Value>,

    /// Keyword arguments
    pub kwargs: Map<String, Value>,

    /// Requested transport delay
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_seconds: Option<u32>,

    pub status: TaskStatus,
}

impl TaskMessage {
    pub fn new(
        worker_key: impl Into<String>,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
        delay_seconds: u32,
    ) -> Self {
        Self {
            msg_id: Uuid::new_v4().to_string(),
            worker_key: worker_key.into(),
            args,
            kwargs,
            delay_seconds: (delay_seconds > 0).then_some(delay_seconds),
            status: TaskStatus::Sent,
        }
    }
}

/// Outer signed wrapper around a serialized task message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Transport-encoded bytes of the inner message
    pub msg_body: String,

    /// Hex digest of the keyed hash over those bytes
    pub msg_signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_serializes_as_the_audit_strings() {
        assert_eq!(serde_json::to_value(TaskStatus::Sent).unwrap(), "Sent");
        assert_eq!(
            serde_json::to_value(TaskStatus::SignatureMismatch).unwrap(),
            "Signature Mismatch"
        );
    }

    #[test]
    fn zero_delay_is_omitted_from_the_wire() {
        let message = TaskMessage::new("jobs.resize", vec![json!(1)], Map::new(), 0);
        let wire = serde_json::to_value(&message).unwrap();
        assert!(wire.get("delay_seconds").is_none());

        let delayed = TaskMessage::new("jobs.resize", vec![], Map::new(), 90);
        assert_eq!(delayed.delay_seconds, Some(90));
    }

    #[test]
    fn message_ids_are_unique() {
        let a = TaskMessage::new("k", vec![], Map::new(), 0);
        let b = TaskMessage::new("k", vec![], Map::new(), 0);
        assert_ne!(a.msg_id, b.msg_id);
    }
}
