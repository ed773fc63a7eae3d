//! Agent Turn-Loop (C5) and Execution Engine (C6): JIT dependency
//! provisioning, the bounded LLM<->tool loop, linear and custom
//! workflow drivers, the streaming event protocol. See spec.md §4.5,
//! §4.6 and SPEC_FULL.md §6, §7.

mod custom_workflow;
mod engine;
mod events;
mod model_client_factory;
mod options;
mod tool_spec_bridge;
mod turn_loop;

pub use custom_workflow::{CustomWorkflow, CustomWorkflowRegistry};
pub use engine::{Engine, EngineBuilder, EngineFacade};
pub use events::EngineEvent;
pub use model_client_factory::ModelClientFactory;
pub use options::RunOptions;
