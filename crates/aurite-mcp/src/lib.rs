//! Tool-Server Host (C3): registration, discovery, and dispatch across
//! subprocess/command/HTTP-stream MCP transports. See spec.md §4.3 and
//! SPEC_FULL.md §4.

mod credentials;
mod discovery;
mod host;
mod mailbox;
mod managed;
mod result;
mod substitution;
mod tool_spec;
mod transport;

pub use credentials::{CredentialResolver, NoopCredentialResolver};
pub use discovery::DiscoveredComponents;
pub use host::{Host, ServerStatus};
pub use result::ToolCallOutcome;
pub use tool_spec::{PromptSpec, ResourceSpec, ToolSpec};
