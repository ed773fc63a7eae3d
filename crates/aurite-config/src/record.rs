//! Parsed, validated configuration plus provenance metadata
//! (spec §3, `ComponentRecord`).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Agent,
    Llm,
    McpServer,
    LinearWorkflow,
    CustomWorkflow,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Agent => "agent",
            ComponentKind::Llm => "llm",
            ComponentKind::McpServer => "mcp_server",
            ComponentKind::LinearWorkflow => "linear_workflow",
            ComponentKind::CustomWorkflow => "custom_workflow",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "agent" => Some(ComponentKind::Agent),
            "llm" => Some(ComponentKind::Llm),
            "mcp_server" => Some(ComponentKind::McpServer),
            "linear_workflow" => Some(ComponentKind::LinearWorkflow),
            "custom_workflow" => Some(ComponentKind::CustomWorkflow),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextLevel {
    /// Highest priority: in-memory records registered programmatically.
    Programmatic,
    Project,
    Workspace,
    User,
}

impl ContextLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextLevel::Programmatic => "programmatic",
            ContextLevel::Project => "project",
            ContextLevel::Workspace => "workspace",
            ContextLevel::User => "user",
        }
    }
}

/// A single component definition plus where it came from. `(kind, id)`
/// is unique within a published `IndexSnapshot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub kind: ComponentKind,
    pub id: String,
    pub body: serde_json::Value,
    pub source_file: Option<PathBuf>,
    pub context_path: PathBuf,
    pub context_level: ContextLevel,
}

impl ComponentRecord {
    pub fn key(&self) -> (ComponentKind, String) {
        (self.kind, self.id.clone())
    }
}
