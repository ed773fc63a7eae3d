//! Structured field validation for each component kind (spec §4.1
//! "Validation API"). Mirrors the teacher's `validate_loaded_config`
//! shape (run every sub-validator, collect rather than bail on first
//! failure) so `validate_all()` can report every problem in one pass.

use serde::Serialize;

use crate::record::{ComponentKind, ComponentRecord};
use crate::schema::{
    AgentConfig, CustomWorkflowConfig, LinearWorkflowConfig, LlmConfig, McpTransport,
    ToolServerConfig,
};

#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub fn validate_record(record: &ComponentRecord) -> Vec<FieldError> {
    match record.kind {
        ComponentKind::Agent => deserialize_and_validate(record, validate_agent),
        ComponentKind::Llm => deserialize_and_validate(record, validate_llm),
        ComponentKind::McpServer => deserialize_and_validate(record, validate_tool_server),
        ComponentKind::LinearWorkflow => {
            deserialize_and_validate(record, validate_linear_workflow)
        }
        ComponentKind::CustomWorkflow => {
            deserialize_and_validate(record, validate_custom_workflow)
        }
    }
}

fn deserialize_and_validate<T, F>(record: &ComponentRecord, validator: F) -> Vec<FieldError>
where
    T: serde::de::DeserializeOwned,
    F: Fn(&T) -> Vec<FieldError>,
{
    match serde_json::from_value::<T>(record.body.clone()) {
        Ok(value) => validator(&value),
        Err(error) => vec![FieldError::new("<body>", error.to_string())],
    }
}

fn validate_agent(agent: &AgentConfig) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if agent.name.is_empty() {
        errors.push(FieldError::new("name", "must not be empty"));
    }
    if agent.max_iterations == 0 {
        errors.push(FieldError::new("max_iterations", "must be >= 1"));
    }
    if let Some(temp) = agent.temperature {
        if !(0.0..=2.0).contains(&temp) {
            errors.push(FieldError::new("temperature", "must be within [0.0, 2.0]"));
        }
    }
    errors
}

fn validate_llm(llm: &LlmConfig) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if llm.name.is_empty() {
        errors.push(FieldError::new("name", "must not be empty"));
    }
    if llm.model.is_empty() {
        errors.push(FieldError::new("model", "must not be empty"));
    }
    errors
}

fn validate_tool_server(server: &ToolServerConfig) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if server.name.is_empty() {
        errors.push(FieldError::new("name", "must not be empty"));
    }
    match &server.transport {
        McpTransport::Subprocess { server_path, .. } => {
            if server_path.is_empty() {
                errors.push(FieldError::new("server_path", "required for subprocess transport"));
            }
        }
        McpTransport::Command { command, .. } => {
            if command.is_empty() {
                errors.push(FieldError::new("command", "required for command transport"));
            }
        }
        McpTransport::HttpStream { http_endpoint, .. } => {
            if http_endpoint.is_empty() {
                errors.push(FieldError::new(
                    "http_endpoint",
                    "required for http_stream transport",
                ));
            }
        }
    }
    if server.timeout_secs == 0 {
        errors.push(FieldError::new("timeout_secs", "must be > 0"));
    }
    if server.registration_timeout_secs == 0 {
        errors.push(FieldError::new(
            "registration_timeout_secs",
            "must be > 0",
        ));
    }
    errors
}

fn validate_linear_workflow(workflow: &LinearWorkflowConfig) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if workflow.name.is_empty() {
        errors.push(FieldError::new("name", "must not be empty"));
    }
    if workflow.steps.is_empty() {
        errors.push(FieldError::new("steps", "must contain at least one step"));
    }
    errors
}

fn validate_custom_workflow(workflow: &CustomWorkflowConfig) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if workflow.name.is_empty() {
        errors.push(FieldError::new("name", "must not be empty"));
    }
    if workflow.module_path.is_empty() {
        errors.push(FieldError::new("module_path", "must not be empty"));
    }
    errors
}
