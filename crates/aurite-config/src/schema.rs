//! Typed views over a [`ComponentRecord`](crate::ComponentRecord)'s
//! `body`, one per `kind` (spec §3's `AgentConfig`/`ToolServerConfig`
//! plus the sibling kinds spec §6 enumerates).

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub llm_config_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub tool_servers: Vec<String>,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_true")]
    pub include_history: bool,
    #[serde(default)]
    pub response_schema: Option<serde_json::Value>,
    #[serde(default)]
    pub excluded_components: Vec<String>,
    #[serde(default)]
    pub auto_tools: bool,
}

fn default_max_iterations() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub name: String,
    #[serde(default = "default_provider")]
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_provider() -> String {
    "anthropic".to_string()
}

/// Per-transport fields (spec §3, `ToolServerConfig`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum McpTransport {
    Subprocess {
        server_path: String,
        #[serde(default)]
        args: Vec<String>,
    },
    Command {
        command: String,
        #[serde(default)]
        args: Vec<String>,
    },
    HttpStream {
        http_endpoint: String,
        #[serde(default)]
        headers: HashMap<String, String>,
    },
}

impl McpTransport {
    pub fn label(&self) -> &'static str {
        match self {
            McpTransport::Subprocess { .. } => "subprocess",
            McpTransport::Command { .. } => "command",
            McpTransport::HttpStream { .. } => "http_stream",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolServerConfig {
    pub name: String,
    #[serde(flatten)]
    pub transport: McpTransport,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_registration_timeout_secs")]
    pub registration_timeout_secs: u64,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_registration_timeout_secs() -> u64 {
    20
}

impl ToolServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn registration_timeout(&self) -> Duration {
        Duration::from_secs(self.registration_timeout_secs)
    }

    /// Resolve any path-bearing fields relative to `context_path`
    /// (spec §4.1 "Path resolution"). Only the subprocess transport
    /// carries a path; the others are left untouched.
    pub fn resolve_paths(&mut self, context_path: &std::path::Path) {
        if let McpTransport::Subprocess { server_path, .. } = &mut self.transport {
            let path = PathBuf::from(&server_path);
            if path.is_relative() {
                *server_path = context_path.join(path).to_string_lossy().into_owned();
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub component_id: String,
    #[serde(default = "default_step_kind")]
    pub component_kind: String,
}

fn default_step_kind() -> String {
    "agent".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearWorkflowConfig {
    pub name: String,
    pub steps: Vec<WorkflowStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomWorkflowConfig {
    pub name: String,
    pub module_path: String,
    #[serde(default)]
    pub class_name: Option<String>,
}

impl CustomWorkflowConfig {
    pub fn resolve_paths(&mut self, context_path: &std::path::Path) {
        let path = PathBuf::from(&self.module_path);
        if path.is_relative() {
            self.module_path = context_path.join(path).to_string_lossy().into_owned();
        }
    }
}
