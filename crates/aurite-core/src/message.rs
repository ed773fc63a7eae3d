//! The conversation data model shared by the Model Client, the
//! Turn-Loop, and the Session Store (spec §3, `Message`/`ContentBlock`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    ToolResult,
}

/// A single turn in a conversation. `blocks` is ordered; callers must
/// not assume a message carries exactly one block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub blocks: Vec<ContentBlock>,
}

impl Message {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            blocks: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    pub fn assistant(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            blocks,
        }
    }

    pub fn tool_result(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::ToolResult,
            blocks,
        }
    }

    /// Concatenation of every `Text` block, in order. Used when a caller
    /// needs "the final text" of an assistant message (e.g. structured
    /// output parsing, linear workflow step chaining).
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn tool_uses(&self) -> impl Iterator<Item = (&str, &str, &serde_json::Value)> {
        self.blocks.iter().filter_map(|block| match block {
            ContentBlock::ToolUse { id, name, input } => {
                Some((id.as_str(), name.as_str(), input))
            }
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: serde_json::Value,
        is_error: bool,
    },
    Thinking {
        text: String,
    },
}

impl ContentBlock {
    pub fn error_result(tool_use_id: impl Into<String>, message: impl Into<String>) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: serde_json::Value::String(message.into()),
            is_error: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_joins_only_text_blocks() {
        let message = Message::assistant(vec![
            ContentBlock::Text {
                text: "hello ".into(),
            },
            ContentBlock::ToolUse {
                id: "t1".into(),
                name: "search".into(),
                input: serde_json::json!({}),
            },
            ContentBlock::Text {
                text: "world".into(),
            },
        ]);
        assert_eq!(message.text(), "hello world");
    }

    #[test]
    fn tool_uses_yields_only_tool_use_blocks_in_order() {
        let message = Message::assistant(vec![
            ContentBlock::ToolUse {
                id: "a".into(),
                name: "one".into(),
                input: serde_json::json!(1),
            },
            ContentBlock::Text { text: "x".into() },
            ContentBlock::ToolUse {
                id: "b".into(),
                name: "two".into(),
                input: serde_json::json!(2),
            },
        ]);
        let names: Vec<&str> = message.tool_uses().map(|(_, name, _)| name).collect();
        assert_eq!(names, vec!["one", "two"]);
    }
}
