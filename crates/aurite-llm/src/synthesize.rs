//! Turns one fully assembled assistant `Message` into the `StreamEvent`
//! sequence a native stream would have produced (spec §4.4's synthesis
//! requirement for non-streaming backends).

use aurite_core::{ContentBlock, Message};

use crate::stream_event::{StopReason, StreamEvent, Usage};

pub fn synthesize_events(message: &Message, stop_reason: StopReason, usage: Option<Usage>) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    for (index, block) in message.blocks.iter().enumerate() {
        match block {
            ContentBlock::Text { text } | ContentBlock::Thinking { text } => {
                events.push(StreamEvent::TextDelta {
                    index,
                    text: text.clone(),
                });
            }
            ContentBlock::ToolUse { id, name, input } => {
                events.push(StreamEvent::ToolUseStart {
                    index,
                    id: id.clone(),
                    name: name.clone(),
                });
                events.push(StreamEvent::ToolUseInputDelta {
                    index,
                    json_chunk: input.to_string(),
                });
            }
            ContentBlock::ToolResult { .. } => {
                // An assistant turn never carries a ToolResult block; skip
                // defensively rather than emit a meaningless event.
                continue;
            }
        }
        events.push(StreamEvent::ContentBlockStop { index });
    }
    events.push(StreamEvent::MessageStop {
        reason: stop_reason,
        usage,
    });
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_message_synthesizes_delta_then_stop_then_message_stop() {
        let message = Message::assistant(vec![ContentBlock::Text { text: "hi".into() }]);
        let events = synthesize_events(&message, StopReason::EndTurn, None);
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], StreamEvent::TextDelta { index: 0, .. }));
        assert!(matches!(events[1], StreamEvent::ContentBlockStop { index: 0 }));
        assert!(matches!(events[2], StreamEvent::MessageStop { reason: StopReason::EndTurn, .. }));
    }

    #[test]
    fn tool_use_message_emits_start_then_input_delta_then_stop() {
        let message = Message::assistant(vec![ContentBlock::ToolUse {
            id: "t1".into(),
            name: "search".into(),
            input: serde_json::json!({"q": "rust"}),
        }]);
        let events = synthesize_events(&message, StopReason::ToolUse, None);
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], StreamEvent::ToolUseStart { index: 0, .. }));
        assert!(matches!(events[1], StreamEvent::ToolUseInputDelta { index: 0, .. }));
        assert!(matches!(events[2], StreamEvent::ContentBlockStop { index: 0 }));
    }

    #[test]
    fn indices_stay_strictly_increasing_across_multiple_blocks() {
        let message = Message::assistant(vec![
            ContentBlock::Text { text: "a".into() },
            ContentBlock::ToolUse {
                id: "t1".into(),
                name: "x".into(),
                input: serde_json::json!({}),
            },
        ]);
        let events = synthesize_events(&message, StopReason::ToolUse, None);
        let indices: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::TextDelta { index, .. }
                | StreamEvent::ToolUseStart { index, .. }
                | StreamEvent::ToolUseInputDelta { index, .. }
                | StreamEvent::ContentBlockStop { index } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(indices, vec![0, 0, 1, 1, 1]);
    }
}
