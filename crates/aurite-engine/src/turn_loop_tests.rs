use super::*;
use aurite_core::ContentBlock;
use aurite_llm::{ScriptedClient, ScriptedTurn, StopReason};

fn agent_cfg(max_iterations: u32, response_schema: Option<serde_json::Value>) -> AgentConfig {
    AgentConfig {
        name: "tester".to_string(),
        llm_config_id: None,
        model: None,
        temperature: None,
        max_tokens: None,
        system_prompt: None,
        tool_servers: Vec::new(),
        max_iterations,
        include_history: true,
        response_schema,
        excluded_components: Vec::new(),
        auto_tools: false,
    }
}

fn text_turn(text: &str) -> ScriptedTurn {
    ScriptedTurn {
        message: Message::assistant(vec![ContentBlock::Text { text: text.into() }]),
        stop_reason: StopReason::EndTurn,
    }
}

#[tokio::test]
async fn a_single_text_turn_succeeds_immediately() {
    let cfg = agent_cfg(5, None);
    let host = Host::new();
    let client = ScriptedClient::new(vec![text_turn("done")]);
    let result = run(
        &cfg,
        vec![Message::user_text("hi")],
        &host,
        &client,
        &[],
        &ModelParams::default(),
        None,
        CancellationToken::new(),
    )
    .await;
    assert_eq!(result.status, ExecutionStatus::Success);
    assert_eq!(result.primary_text().as_deref(), Some("done"));
}

#[tokio::test]
async fn unroutable_tool_call_yields_error_block_and_the_loop_continues() {
    let cfg = agent_cfg(5, None);
    let host = Host::new();
    let tool_turn = ScriptedTurn {
        message: Message::assistant(vec![ContentBlock::ToolUse {
            id: "t1".into(),
            name: "nothing-registered".into(),
            input: serde_json::json!({}),
        }]),
        stop_reason: StopReason::ToolUse,
    };
    let client = ScriptedClient::new(vec![tool_turn, text_turn("recovered")]);
    let result = run(
        &cfg,
        vec![Message::user_text("hi")],
        &host,
        &client,
        &[],
        &ModelParams::default(),
        None,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(result.status, ExecutionStatus::Success);
    let tool_result_message = result
        .conversation
        .iter()
        .find(|message| matches!(message.role, aurite_core::Role::ToolResult))
        .expect("a tool_result message was appended");
    match &tool_result_message.blocks[0] {
        ContentBlock::ToolResult { is_error, .. } => assert!(is_error),
        other => panic!("unexpected block: {other:?}"),
    }
}

#[tokio::test]
async fn exhausting_max_iterations_reports_that_status() {
    let cfg = agent_cfg(2, None);
    let host = Host::new();
    let tool_turn = || ScriptedTurn {
        message: Message::assistant(vec![ContentBlock::ToolUse {
            id: "t1".into(),
            name: "missing".into(),
            input: serde_json::json!({}),
        }]),
        stop_reason: StopReason::ToolUse,
    };
    let client = ScriptedClient::new(vec![tool_turn(), tool_turn()]);
    let result = run(
        &cfg,
        vec![Message::user_text("hi")],
        &host,
        &client,
        &[],
        &ModelParams::default(),
        None,
        CancellationToken::new(),
    )
    .await;
    assert_eq!(result.status, ExecutionStatus::MaxIterations);
}

#[tokio::test]
async fn invalid_structured_output_triggers_a_correction_turn() {
    let schema = serde_json::json!({
        "type": "object",
        "required": ["answer"],
        "properties": { "answer": { "type": "string" } }
    });
    let cfg = agent_cfg(5, Some(schema));
    let host = Host::new();
    let bad_json = ScriptedTurn {
        message: Message::assistant(vec![ContentBlock::Text { text: "not json".into() }]),
        stop_reason: StopReason::EndTurn,
    };
    let good_json = ScriptedTurn {
        message: Message::assistant(vec![ContentBlock::Text {
            text: serde_json::json!({"answer": "42"}).to_string(),
        }]),
        stop_reason: StopReason::EndTurn,
    };
    let client = ScriptedClient::new(vec![bad_json, good_json]);
    let result = run(
        &cfg,
        vec![Message::user_text("hi")],
        &host,
        &client,
        &[],
        &ModelParams::default(),
        None,
        CancellationToken::new(),
    )
    .await;
    assert_eq!(result.status, ExecutionStatus::Success);
    assert!(result.conversation.iter().any(|m| m.text().contains("did not satisfy")));
}
