//! The Host's own tool-call result shape (spec §4.3 "tool dispatch").
//! Tool-side failures are data, never an `Err`, so the Engine's
//! Turn-Loop can always append a `ToolResult` content block.

use rmcp::model::CallToolResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallOutcome {
    pub content: serde_json::Value,
    pub is_error: bool,
}

impl ToolCallOutcome {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: serde_json::Value::String(message.into()),
            is_error: true,
        }
    }
}

impl From<CallToolResult> for ToolCallOutcome {
    fn from(result: CallToolResult) -> Self {
        let is_error = result.is_error.unwrap_or(false);
        let content = serde_json::to_value(&result.content).unwrap_or(serde_json::Value::Null);
        Self { content, is_error }
    }
}
