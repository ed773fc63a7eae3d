//! Agent Turn-Loop (C5): bounded iteration over the Model Client and
//! the Tool-Server Host (spec §4.5), grounded on
//! `siumai_extras::schema::validate_json`'s `jsonschema::validator_for`
//! / `iter_errors` pattern for the structured-output correction branch.

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use aurite_config::AgentConfig;
use aurite_core::{ContentBlock, ExecutionResult, ExecutionStatus, Message};
use aurite_llm::{ModelClient, ModelParams, ToolSpec};
use aurite_mcp::Host;

/// Builds the effective system prompt (spec §4.5 step 1): the agent's
/// own prompt, with schema-and-JSON instructions appended when
/// `response_schema` is present.
pub fn effective_system_prompt(agent_cfg: &AgentConfig, override_prompt: Option<&str>) -> Option<String> {
    let base = override_prompt
        .map(str::to_string)
        .or_else(|| agent_cfg.system_prompt.clone());

    match &agent_cfg.response_schema {
        Some(schema) => {
            let instruction = format!(
                "Respond with only a single JSON value matching this schema, no surrounding prose:\n{schema}"
            );
            Some(match base {
                Some(existing) => format!("{existing}\n\n{instruction}"),
                None => instruction,
            })
        }
        None => base,
    }
}

fn validate_against_schema(schema: &serde_json::Value, text: &str) -> Result<(), Vec<String>> {
    let instance: serde_json::Value = serde_json::from_str(text).map_err(|error| {
        vec![format!("response is not valid JSON: {error}")]
    })?;

    let validator = jsonschema::validator_for(schema).map_err(|error| {
        vec![format!("response_schema itself is invalid: {error}")]
    })?;

    if validator.is_valid(&instance) {
        return Ok(());
    }

    let errors: Vec<String> = validator
        .iter_errors(&instance)
        .take(5)
        .map(|error| format!("{error} at {}", error.instance_path))
        .collect();
    Err(errors)
}

/// Runs the Turn-Loop to completion or exhaustion (spec §4.5).
/// `tool_specs` must already be filtered to `agent_cfg.tool_servers`
/// minus `excluded_components` (the Engine does this before calling in,
/// since only it can see the Host's full tool map).
pub async fn run(
    agent_cfg: &AgentConfig,
    mut conversation: Vec<Message>,
    host: &Host,
    model_client: &dyn ModelClient,
    tool_specs: &[ToolSpec],
    params: &ModelParams,
    system_prompt: Option<&str>,
    cancellation: CancellationToken,
) -> ExecutionResult {
    let max_iterations = agent_cfg.max_iterations.max(1);

    for _iteration in 0..max_iterations {
        if cancellation.is_cancelled() {
            return ExecutionResult {
                status: ExecutionStatus::Error,
                conversation,
                final_message: None,
                tool_uses_in_final_turn: 0,
                error: Some("cancelled".to_string()),
            };
        }

        let assistant_message = match model_client
            .complete(&conversation, tool_specs, system_prompt, params)
            .await
        {
            Ok(message) => message,
            Err(error) => {
                return ExecutionResult {
                    status: ExecutionStatus::Error,
                    conversation,
                    final_message: None,
                    tool_uses_in_final_turn: 0,
                    error: Some(error.to_string()),
                };
            }
        };

        conversation.push(assistant_message.clone());

        let tool_uses: Vec<(String, String, serde_json::Value)> = assistant_message
            .tool_uses()
            .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
            .collect();

        if tool_uses.is_empty() {
            if let Some(schema) = &agent_cfg.response_schema {
                match validate_against_schema(schema, &assistant_message.text()) {
                    Ok(()) => {
                        return ExecutionResult {
                            status: ExecutionStatus::Success,
                            tool_uses_in_final_turn: 0,
                            final_message: Some(assistant_message),
                            conversation,
                            error: None,
                        };
                    }
                    Err(errors) => {
                        conversation.push(Message::user_text(format!(
                            "Your previous response did not satisfy the required schema: {}. Respond again with only the corrected JSON.",
                            errors.join("; ")
                        )));
                        continue;
                    }
                }
            }

            return ExecutionResult {
                status: ExecutionStatus::Success,
                tool_uses_in_final_turn: 0,
                final_message: Some(assistant_message),
                conversation,
                error: None,
            };
        }

        let dispatches = tool_uses.iter().map(|(id, name, input)| {
            let cancellation = cancellation.clone();
            async move {
                let outcome = host.call_tool(name, input.clone(), cancellation).await;
                ContentBlock::ToolResult {
                    tool_use_id: id.clone(),
                    content: outcome.content,
                    is_error: outcome.is_error,
                }
            }
        });
        let tool_result_blocks: Vec<ContentBlock> = join_all(dispatches).await;

        conversation.push(Message::tool_result(tool_result_blocks));
    }

    ExecutionResult {
        status: ExecutionStatus::MaxIterations,
        conversation,
        final_message: None,
        tool_uses_in_final_turn: 0,
        error: Some(format!("exhausted max_iterations ({max_iterations})")),
    }
}

#[cfg(test)]
#[path = "turn_loop_tests.rs"]
mod tests;
