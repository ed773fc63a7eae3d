//! Shared data model and error taxonomy for the Aurite runtime.
//!
//! No I/O lives here: this crate is imported by every other `aurite-*`
//! crate and must stay free of filesystem, process, or network
//! dependencies so it can be linked into tests cheaply.

pub mod error;
pub mod ids;
pub mod message;
pub mod result;

pub use error::{AuriteError, ErrorContext};
pub use ids::{ensure_prefixed, new_agent_session_id, new_workflow_session_id};
pub use message::{ContentBlock, Message, Role};
pub use result::{ExecutionResult, ExecutionStatus, WorkflowResult, WorkflowStepResult};
