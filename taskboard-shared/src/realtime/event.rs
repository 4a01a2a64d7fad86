/// Realtime wire messages
///
/// Server frames are `{"event": <name>, "data": <payload>}`; client frames
/// are tagged by `type`.
///
/// ```text
/// client: {"type":"joinProject","project_id":7}
/// server: {"event":"joined","data":{"project_id":7,"channel":"project_7"}}
/// server: {"event":"taskCreated","data":{"id":3,"title":"...",...}}
/// server: {"event":"taskDeleted","data":{"id":3}}
/// ```

use serde::{Deserialize, Serialize};

use crate::models::task::Task;

/// A task mutation fanned out to a project's subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum TaskEvent {
    TaskCreated(Task),
    TaskUpdated(Task),
    TaskDeleted { id: i64 },
}

impl TaskEvent {
    /// Event name as sent on the wire
    pub fn name(&self) -> &'static str {
        match self {
            TaskEvent::TaskCreated(_) => "taskCreated",
            TaskEvent::TaskUpdated(_) => "taskUpdated",
            TaskEvent::TaskDeleted { .. } => "taskDeleted",
        }
    }
}

/// Frames a client may send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    JoinProject { project_id: i64 },
    LeaveProject { project_id: i64 },
}

/// Control frames the server sends besides task events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    Joined { project_id: i64, channel: String },
    Left { project_id: i64 },
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}
