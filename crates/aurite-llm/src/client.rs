//! The Model Client contract (spec §4.4), grounded on
//! `siumai_core::traits::chat::ChatCapability`'s `complete`/`stream`
//! split over `async_trait`.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use aurite_core::{AuriteError, Message};

use crate::params::{ModelParams, ToolSpec};
use crate::stream_event::StreamEvent;

pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Calls the provider once and returns a fully assembled assistant
    /// message (spec §3's `Message` form, `role = assistant`).
    async fn complete(
        &self,
        messages: &[Message],
        tool_specs: &[ToolSpec],
        system_prompt: Option<&str>,
        params: &ModelParams,
    ) -> Result<Message, AuriteError>;

    /// A lazy sequence of `StreamEvent`. Providers that do not natively
    /// stream synthesize these events from a single `complete` call
    /// (spec §4.4); `AnthropicClient` in this crate takes that path
    /// deliberately rather than driving the provider's own SSE endpoint,
    /// since the Engine only ever observes the event contract, never
    /// the transport underneath it.
    async fn stream(
        &self,
        messages: &[Message],
        tool_specs: &[ToolSpec],
        system_prompt: Option<&str>,
        params: &ModelParams,
    ) -> Result<EventStream, AuriteError>;
}
