//! Error taxonomy (spec §7). Every variant is a tagged kind rather than
//! a provider-specific name, matching the shape of `csa-core::AppError`
//! but scoped to configuration, tool-server, and turn-loop failures.

use serde::Serialize;

/// Context attached to an `AuriteError` for the programmatic error
/// envelope described in spec §6.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorContext {
    pub component_kind: Option<String>,
    pub component_id: Option<String>,
    pub session_id: Option<String>,
    pub server_id: Option<String>,
}

impl ErrorContext {
    pub fn component(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            component_kind: Some(kind.into()),
            component_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_server(mut self, server_id: impl Into<String>) -> Self {
        self.server_id = Some(server_id.into());
        self
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AuriteError {
    #[error("no {kind} named '{id}'")]
    ConfigNotFound { kind: String, id: String },

    #[error("config '{kind}/{id}' is invalid: {errors:?}")]
    ConfigInvalid {
        kind: String,
        id: String,
        errors: Vec<String>,
    },

    #[error("programmatic registration of '{kind}/{id}' conflicts with an existing record")]
    ConfigConflict { kind: String, id: String },

    #[error("tool server '{server_id}' failed to register during phase '{phase}': {reason}")]
    ToolServerRegistrationFailed {
        server_id: String,
        phase: String,
        reason: String,
    },

    #[error("tool server '{server_id}' timed out during '{operation}'")]
    ToolServerTimeout { server_id: String, operation: String },

    #[error("tool '{tool_name}' invocation failed: {reason}")]
    ToolInvocationFailed { tool_name: String, reason: String },

    #[error("structured output failed schema validation: {errors:?}")]
    SchemaValidationFailed { errors: Vec<String> },

    #[error("agent exhausted max_iterations ({0}) without reaching a final turn")]
    MaxIterationsReached(u32),

    #[error("model client call failed (retryable={retryable}): {reason}")]
    ModelClientFailed { reason: String, retryable: bool },

    #[error("no session matching '{0}'")]
    SessionNotFound(String),

    #[error("ambiguous partial session id '{prefix}': matches {candidates:?}")]
    AmbiguousPartialId {
        prefix: String,
        candidates: Vec<String>,
    },

    #[error("custom workflow '{workflow_id}' failed: {wrapped}")]
    CustomWorkflowFailed { workflow_id: String, wrapped: String },
}

impl AuriteError {
    /// Whether the error kind is, by its own nature, retryable at the
    /// API boundary. Transient `ModelClientFailed` variants carry their
    /// own flag; everything else is fixed per-kind.
    pub fn retryable(&self) -> bool {
        match self {
            AuriteError::ModelClientFailed { retryable, .. } => *retryable,
            AuriteError::ToolServerTimeout { .. } | AuriteError::ToolInvocationFailed { .. } => {
                true
            }
            _ => false,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            AuriteError::ConfigNotFound { .. } => "ConfigNotFound",
            AuriteError::ConfigInvalid { .. } => "ConfigInvalid",
            AuriteError::ConfigConflict { .. } => "ConfigConflict",
            AuriteError::ToolServerRegistrationFailed { .. } => "ToolServerRegistrationFailed",
            AuriteError::ToolServerTimeout { .. } => "ToolServerTimeout",
            AuriteError::ToolInvocationFailed { .. } => "ToolInvocationFailed",
            AuriteError::SchemaValidationFailed { .. } => "SchemaValidationFailed",
            AuriteError::MaxIterationsReached(_) => "MaxIterationsReached",
            AuriteError::ModelClientFailed { .. } => "ModelClientFailed",
            AuriteError::SessionNotFound(_) => "SessionNotFound",
            AuriteError::AmbiguousPartialId { .. } => "AmbiguousPartialId",
            AuriteError::CustomWorkflowFailed { .. } => "CustomWorkflowFailed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_client_failed_retryable_follows_its_flag() {
        let transient = AuriteError::ModelClientFailed {
            reason: "503".into(),
            retryable: true,
        };
        assert!(transient.retryable());

        let permanent = AuriteError::ModelClientFailed {
            reason: "invalid api key".into(),
            retryable: false,
        };
        assert!(!permanent.retryable());
    }

    #[test]
    fn max_iterations_is_not_retryable() {
        assert!(!AuriteError::MaxIterationsReached(5).retryable());
    }

    #[test]
    fn display_messages_are_stable() {
        let err = AuriteError::SessionNotFound("abc".into());
        assert_eq!(err.to_string(), "no session matching 'abc'");
    }
}
