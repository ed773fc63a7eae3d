//! Model Client (C4): a polymorphic contract over `{complete, stream}`
//! plus a concrete Anthropic backend. See spec.md §4.4 and SPEC_FULL.md
//! §5.

mod anthropic;
mod client;
mod params;
#[cfg(any(test, feature = "test-util"))]
mod scripted;
mod stream_event;
mod synthesize;

pub use anthropic::AnthropicClient;
pub use client::{EventStream, ModelClient};
pub use params::{ModelParams, ToolSpec};
#[cfg(any(test, feature = "test-util"))]
pub use scripted::{ScriptedClient, ScriptedTurn};
pub use stream_event::{StopReason, StreamEvent, Usage};
