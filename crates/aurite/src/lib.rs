//! Facade crate re-exporting the public surface of the Aurite runtime
//! (spec.md §1's "core" triplet: Config Index, Tool-Server Host,
//! Execution Engine). Sits atop `aurite-config`/`aurite-session`/
//! `aurite-mcp`/`aurite-llm`/`aurite-engine` the way the teacher's
//! `weave` binary sits atop `csa-config` — except this crate is a
//! library only; the CLI/HTTP server are out of scope (spec.md §1) and
//! left to an external collaborator.

use std::path::PathBuf;
use std::sync::Arc;

pub mod prelude {
    pub use aurite_config::{
        AgentConfig, ComponentKind, ComponentRecord, ConfigIndex, ContextLevel, CustomWorkflowConfig,
        FieldError, LinearWorkflowConfig, LlmConfig, McpTransport, ToolServerConfig, WorkflowStep,
    };
    pub use aurite_core::{
        AuriteError, ContentBlock, ErrorContext, ExecutionResult, ExecutionStatus, Message, Role,
        WorkflowResult, WorkflowStepResult,
    };
    pub use aurite_engine::{CustomWorkflow, CustomWorkflowRegistry, Engine, EngineBuilder, EngineEvent, EngineFacade, RunOptions};
    pub use aurite_llm::{AnthropicClient, ModelClient, ModelParams, StopReason, StreamEvent, ToolSpec, Usage};
    pub use aurite_mcp::{
        CredentialResolver, DiscoveredComponents, Host, NoopCredentialResolver, PromptSpec, ResourceSpec,
        ServerStatus, ToolCallOutcome,
    };
    pub use aurite_session::{Session, SessionFilter, SessionKind, SessionStore};
    pub use tokio_util::sync::CancellationToken;
}

use prelude::*;

/// Convenience constructor wiring a `ConfigIndex` rooted at a working
/// directory to a freshly built `Engine`, mirroring the one-call setup
/// most consumers want (spec.md §2's Engine control-flow diagram).
/// Consumers needing finer control (a shared `Host`, a pre-populated
/// `CustomWorkflowRegistry`, a non-default session cache dir) should
/// reach for `EngineBuilder` directly instead.
pub fn engine_for_working_dir(working_dir: impl Into<PathBuf>) -> Engine {
    let config = Arc::new(ConfigIndex::new(working_dir));
    EngineBuilder::new().build(config)
}
