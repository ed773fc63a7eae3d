//! The normalized event stream every `ModelClient::stream` implementation
//! must emit (spec §4.4), verbatim from spec.md. Grounded on the shape of
//! `siumai_core::types::streaming::ChatStreamEvent` — a tagged union a
//! non-streaming backend synthesizes from a single completion just as
//! easily as a truly streaming one forwards it event-by-event.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Usage {
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
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
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
    },
    Error {
        message: String,
    },
}

/// Why the assistant turn ended. `ToolUse` drives the Turn-Loop's tool
/// dispatch branch (spec §4.5 step 3d); every other reason is terminal
/// unless a `response_schema` correction reopens the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
}
