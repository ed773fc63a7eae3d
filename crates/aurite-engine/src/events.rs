//! The streaming envelope `stream_agent` emits (spec §4.6, §6
//! "Streaming event envelope"): the six `StreamEvent` variants from
//! spec §4.4 plus the Engine's own `session_info`/`stream_end`/
//! `tool_result` framing.

use serde::Serialize;

use aurite_llm::{StopReason, StreamEvent, Usage};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    SessionInfo {
        session_id: String,
    },
    TextDelta {
        index: usize,
        text: String,
    },
    ToolUseStart {
        index: usize,
        id: String,
        name: String,
    },
    ToolUseInputDelta {
        index: usize,
        json_chunk: String,
    },
    ContentBlockStop {
        index: usize,
    },
    MessageStop {
        reason: StopReason,
        #[serde(skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
    },
    ToolResult {
        tool_use_id: String,
        content: serde_json::Value,
        is_error: bool,
    },
    Error {
        message: String,
    },
    StreamEnd,
}

impl From<StreamEvent> for EngineEvent {
    fn from(event: StreamEvent) -> Self {
        match event {
            StreamEvent::TextDelta { index, text } => EngineEvent::TextDelta { index, text },
            StreamEvent::ToolUseStart { index, id, name } => {
                EngineEvent::ToolUseStart { index, id, name }
            }
            StreamEvent::ToolUseInputDelta { index, json_chunk } => {
                EngineEvent::ToolUseInputDelta { index, json_chunk }
            }
            StreamEvent::ContentBlockStop { index } => EngineEvent::ContentBlockStop { index },
            StreamEvent::MessageStop { reason, usage } => EngineEvent::MessageStop { reason, usage },
            StreamEvent::Error { message } => EngineEvent::Error { message },
        }
    }
}
