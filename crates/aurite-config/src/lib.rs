//! Configuration Index (C1): hierarchical discovery and first-match
//! resolution of component definitions across nested `.aurite` anchor
//! files. See spec.md §4.1 and SPEC_FULL.md §2.

mod anchor;
mod discovery;
mod index;
mod record;
mod schema;
mod validate;

pub use anchor::{AnchorFile, AnchorKind};
pub use index::{ConfigIndex, FieldError};
pub use record::{ComponentKind, ComponentRecord, ContextLevel};
pub use schema::{
    AgentConfig, CustomWorkflowConfig, LinearWorkflowConfig, LlmConfig, McpTransport,
    ToolServerConfig, WorkflowStep,
};
