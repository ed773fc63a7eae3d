//! Provider-agnostic view over a discovered MCP tool (spec §4.3
//! "component discovery"). The Model Client and Turn-Loop consume this
//! instead of `rmcp::model::Tool` so C4/C5 never depend on `rmcp`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// `"{server_id}-{original_name}"`, globally unique within a Host.
    pub qualified_name: String,
    /// The name as reported by the server, preserved for display.
    pub original_name: String,
    pub server_id: String,
    pub description: Option<String>,
    pub input_schema: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSpec {
    pub qualified_name: String,
    pub original_name: String,
    pub server_id: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub qualified_name: String,
    pub original_name: String,
    pub server_id: String,
    pub uri: String,
    pub description: Option<String>,
}

pub fn qualify(server_id: &str, name: &str) -> String {
    format!("{server_id}-{name}")
}
