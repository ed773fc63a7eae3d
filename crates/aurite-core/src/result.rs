//! Turn-loop and workflow result types (spec §4.5, §4.6).

use serde::{Deserialize, Serialize};

use crate::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    MaxIterations,
    Error,
}

/// Returned by the Turn-Loop (C5) and surfaced by the Engine (C6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub conversation: Vec<Message>,
    pub final_message: Option<Message>,
    pub tool_uses_in_final_turn: usize,
    pub error: Option<String>,
}

impl ExecutionResult {
    /// The assembled text of the final assistant message, if any. This
    /// is what scenario S2 calls `primary_text`.
    pub fn primary_text(&self) -> Option<String> {
        self.final_message.as_ref().map(Message::text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStepResult {
    pub component_id: String,
    pub session_id: String,
    pub result: Result<ExecutionResult, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub session_id: String,
    pub base_session_id: String,
    pub steps: Vec<WorkflowStepResult>,
    pub final_output: Option<String>,
}

impl WorkflowResult {
    pub fn any_step_failed(&self) -> bool {
        self.steps.iter().any(|step| step.result.is_err())
    }
}
