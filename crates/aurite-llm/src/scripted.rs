//! A pre-programmed `ModelClient` for exercising `aurite-engine`'s
//! turn-loop without a network call — "fake the trait, not the wire",
//! the same style `siumai`'s own test suite uses for its capability
//! traits rather than mocking HTTP.

use std::sync::Mutex;

use async_trait::async_trait;

use aurite_core::{AuriteError, Message};

use crate::client::{EventStream, ModelClient};
use crate::params::{ModelParams, ToolSpec};
use crate::stream_event::StopReason;
use crate::synthesize::synthesize_events;

/// One scripted assistant turn: the message to return plus the stop
/// reason that drives the Turn-Loop's branch (spec §4.5 step 3).
#[derive(Debug, Clone)]
pub struct ScriptedTurn {
    pub message: Message,
    pub stop_reason: StopReason,
}

pub struct ScriptedClient {
    turns: Mutex<Vec<ScriptedTurn>>,
}

impl ScriptedClient {
    pub fn new(turns: Vec<ScriptedTurn>) -> Self {
        // Stored in call order; `next_turn` pops from the front via
        // `remove(0)` since scripts are short and ordering matters more
        // than pop efficiency.
        Self {
            turns: Mutex::new(turns),
        }
    }

    fn next_turn(&self) -> Result<ScriptedTurn, AuriteError> {
        let mut turns = self.turns.lock().expect("scripted client lock poisoned");
        if turns.is_empty() {
            return Err(AuriteError::ModelClientFailed {
                reason: "scripted client exhausted its turn list".to_string(),
                retryable: false,
            });
        }
        Ok(turns.remove(0))
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn complete(
        &self,
        _messages: &[Message],
        _tool_specs: &[ToolSpec],
        _system_prompt: Option<&str>,
        _params: &ModelParams,
    ) -> Result<Message, AuriteError> {
        Ok(self.next_turn()?.message)
    }

    async fn stream(
        &self,
        _messages: &[Message],
        _tool_specs: &[ToolSpec],
        _system_prompt: Option<&str>,
        _params: &ModelParams,
    ) -> Result<EventStream, AuriteError> {
        let turn = self.next_turn()?;
        let events = synthesize_events(&turn.message, turn.stop_reason, None);
        Ok(Box::pin(futures::stream::iter(events)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurite_core::ContentBlock;
    use futures::StreamExt;

    fn text_turn(text: &str) -> ScriptedTurn {
        ScriptedTurn {
            message: Message::assistant(vec![ContentBlock::Text { text: text.into() }]),
            stop_reason: StopReason::EndTurn,
        }
    }

    #[tokio::test]
    async fn complete_returns_turns_in_order() {
        let client = ScriptedClient::new(vec![text_turn("first"), text_turn("second")]);
        let first = client.complete(&[], &[], None, &ModelParams::default()).await.unwrap();
        let second = client.complete(&[], &[], None, &ModelParams::default()).await.unwrap();
        assert_eq!(first.text(), "first");
        assert_eq!(second.text(), "second");
    }

    #[tokio::test]
    async fn exhausted_script_is_a_model_client_failure() {
        let client = ScriptedClient::new(vec![]);
        let result = client.complete(&[], &[], None, &ModelParams::default()).await;
        assert!(matches!(result, Err(AuriteError::ModelClientFailed { retryable: false, .. })));
    }

    #[tokio::test]
    async fn stream_synthesizes_events_from_the_scripted_turn() {
        let client = ScriptedClient::new(vec![text_turn("hi")]);
        let stream = client.stream(&[], &[], None, &ModelParams::default()).await.unwrap();
        let events: Vec<_> = stream.collect().await;
        assert_eq!(events.len(), 3);
    }
}
