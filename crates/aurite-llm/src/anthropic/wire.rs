//! Anthropic Messages API wire shapes and the translation to/from
//! spec §3's `Message`/`ContentBlock`. Header and endpoint shape
//! grounded on `siumai_protocol_anthropic::standards::anthropic::chat`'s
//! `build_headers`/`messages_endpoint` (`x-api-key`,
//! `anthropic-version: 2023-06-01`, `/v1/messages`).

use serde::{Deserialize, Serialize};

use aurite_core::{ContentBlock, Message, Role};

use crate::params::ToolSpec;
use crate::stream_event::StopReason;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const MESSAGES_PATH: &str = "/v1/messages";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

#[derive(Debug, Serialize)]
pub struct WireRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<WireTool>,
}

#[derive(Debug, Serialize)]
pub struct WireTool {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_schema: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    pub content: Vec<WireBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireBlock {
    Text {
        text: String,
    },
    Thinking {
        thinking: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: serde_json::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

#[derive(Debug, Deserialize)]
pub struct WireResponse {
    pub content: Vec<WireBlock>,
    pub stop_reason: Option<String>,
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
pub struct WireUsage {
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
}

pub fn to_wire_tools(tool_specs: &[ToolSpec]) -> Vec<WireTool> {
    tool_specs
        .iter()
        .map(|spec| WireTool {
            name: spec.name.clone(),
            description: spec.description.clone(),
            input_schema: spec.input_schema.clone(),
        })
        .collect()
}

/// Anthropic has no `tool_result` role: a `Message{role: ToolResult,
/// ..}` maps onto a `user`-role wire message carrying `ToolResult`
/// blocks, same as the provider's own convention.
pub fn to_wire_messages(messages: &[Message]) -> Vec<WireMessage> {
    messages.iter().map(to_wire_message).collect()
}

fn to_wire_message(message: &Message) -> WireMessage {
    let role = match message.role {
        Role::User | Role::ToolResult => "user",
        Role::Assistant => "assistant",
    };
    WireMessage {
        role: role.to_string(),
        content: message.blocks.iter().map(to_wire_block).collect(),
    }
}

fn to_wire_block(block: &ContentBlock) -> WireBlock {
    match block {
        ContentBlock::Text { text } => WireBlock::Text { text: text.clone() },
        ContentBlock::Thinking { text } => WireBlock::Thinking {
            thinking: text.clone(),
        },
        ContentBlock::ToolUse { id, name, input } => WireBlock::ToolUse {
            id: id.clone(),
            name: name.clone(),
            input: input.clone(),
        },
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => WireBlock::ToolResult {
            tool_use_id: tool_use_id.clone(),
            content: content.clone(),
            is_error: if *is_error { Some(true) } else { None },
        },
    }
}

pub fn from_wire_blocks(blocks: Vec<WireBlock>) -> Vec<ContentBlock> {
    blocks
        .into_iter()
        .map(|block| match block {
            WireBlock::Text { text } => ContentBlock::Text { text },
            WireBlock::Thinking { thinking } => ContentBlock::Thinking { text: thinking },
            WireBlock::ToolUse { id, name, input } => ContentBlock::ToolUse { id, name, input },
            WireBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error: is_error.unwrap_or(false),
            },
        })
        .collect()
}

pub fn stop_reason_from_wire(reason: Option<&str>) -> StopReason {
    match reason {
        Some("tool_use") => StopReason::ToolUse,
        Some("max_tokens") => StopReason::MaxTokens,
        Some("stop_sequence") => StopReason::StopSequence,
        _ => StopReason::EndTurn,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_result_message_maps_to_user_role() {
        let message = Message::tool_result(vec![ContentBlock::ToolResult {
            tool_use_id: "t1".into(),
            content: serde_json::json!("ok"),
            is_error: false,
        }]);
        let wire = to_wire_message(&message);
        assert_eq!(wire.role, "user");
    }

    #[test]
    fn unknown_stop_reason_defaults_to_end_turn() {
        assert_eq!(stop_reason_from_wire(Some("refusal")), StopReason::EndTurn);
        assert_eq!(stop_reason_from_wire(None), StopReason::EndTurn);
    }
}
