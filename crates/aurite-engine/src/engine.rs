//! Execution Engine (C6): the public surface spec.md §4.6 describes,
//! plus the `EngineBuilder` SPEC_FULL.md §7 adds on top of it.

use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use aurite_config::ConfigIndex;
use aurite_core::{
    ensure_prefixed, new_agent_session_id, new_workflow_session_id, AuriteError, ContentBlock,
    ExecutionResult, ExecutionStatus, Message, WorkflowResult, WorkflowStepResult,
};
use aurite_llm::ModelParams;
use aurite_mcp::Host;
use aurite_session::SessionStore;

use crate::custom_workflow::CustomWorkflowRegistry;
use crate::events::EngineEvent;
use crate::model_client_factory::ModelClientFactory;
use crate::options::RunOptions;
use crate::tool_spec_bridge::resolve_tool_specs;
use crate::turn_loop;

const DEFAULT_LLM_CONFIG_ID: &str = "default";

/// Cheaply cloneable: every field is an `Arc`, so handing a copy to a
/// custom workflow's `EngineFacade` or to a linear workflow's recursive
/// step never duplicates the underlying Host/Store/Index.
#[derive(Clone)]
pub struct Engine {
    config: Arc<ConfigIndex>,
    host: Arc<Host>,
    sessions: Arc<SessionStore>,
    workflows: Arc<CustomWorkflowRegistry>,
}

pub struct EngineBuilder {
    config: Option<Arc<ConfigIndex>>,
    host: Option<Arc<Host>>,
    sessions: Option<Arc<SessionStore>>,
    workflows: Arc<CustomWorkflowRegistry>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            host: None,
            sessions: None,
            workflows: Arc::new(CustomWorkflowRegistry::new()),
        }
    }

    pub fn config_index(mut self, config: Arc<ConfigIndex>) -> Self {
        self.config = Some(config);
        self
    }

    pub fn tool_server_host(mut self, host: Arc<Host>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn session_store(mut self, sessions: Arc<SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    pub fn custom_workflows(mut self, workflows: Arc<CustomWorkflowRegistry>) -> Self {
        self.workflows = workflows;
        self
    }

    /// `config` is required; `host` and `sessions` default to a fresh
    /// `Host::new()` and the store's own default cache directory.
    pub fn build(self, config: Arc<ConfigIndex>) -> Engine {
        Engine {
            config: self.config.unwrap_or(config),
            host: self.host.unwrap_or_else(|| Arc::new(Host::new())),
            sessions: self.sessions.unwrap_or_else(|| {
                let cache_dir = SessionStore::default_cache_dir()
                    .unwrap_or_else(|| std::env::temp_dir().join("aurite-sessions"));
                Arc::new(SessionStore::new(cache_dir))
            }),
            workflows: self.workflows,
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Registers every one of `agent_cfg.tool_servers` that the Host
    /// does not already report as `ready` (spec §4.6 step 3). Newly
    /// registered servers persist across calls.
    async fn ensure_tool_servers_ready(&self, tool_servers: &[String]) -> Result<(), AuriteError> {
        for server_id in tool_servers {
            if self.host.is_ready(server_id) {
                continue;
            }
            let config = self.config.get_tool_server(server_id)?;
            self.host.register(config).await?;
        }
        Ok(())
    }

    fn resolve_model_client(
        &self,
        llm_config_id: Option<&str>,
    ) -> Result<(Arc<dyn aurite_llm::ModelClient>, aurite_llm::ModelParams), AuriteError> {
        let llm_config_id = llm_config_id.unwrap_or(DEFAULT_LLM_CONFIG_ID);
        let llm_cfg = self.config.get_llm(llm_config_id)?;
        let client = ModelClientFactory::create(&llm_cfg)?;
        Ok((client, ModelParams::default()))
    }

    /// Steps 1-5 of spec §4.6's per-call agent flow, shared by
    /// `run_agent` and `stream_agent`.
    async fn prepare_agent_call(
        &self,
        agent_id: &str,
        user_message: &str,
        options: &RunOptions,
    ) -> Result<
        (
            aurite_config::AgentConfig,
            String,
            String,
            bool,
            Vec<Message>,
            Arc<dyn aurite_llm::ModelClient>,
            ModelParams,
            Vec<aurite_llm::ToolSpec>,
        ),
        AuriteError,
    > {
        let agent_cfg = self.config.get_agent(agent_id)?;

        let effective_include_history = options
            .force_include_history
            .unwrap_or(agent_cfg.include_history);

        let session_id = match &options.session_id {
            Some(id) => ensure_prefixed(id, "agent-"),
            None => new_agent_session_id(),
        };
        let base_id = options.base_session_id.clone().unwrap_or_else(|| session_id.clone());

        self.ensure_tool_servers_ready(&agent_cfg.tool_servers).await?;

        let (client, client_defaults) = self.resolve_model_client(agent_cfg.llm_config_id.as_deref())?;
        let overrides = ModelParams {
            model: agent_cfg.model.clone(),
            temperature: agent_cfg.temperature,
            max_tokens: agent_cfg.max_tokens,
            system_prompt: turn_loop::effective_system_prompt(
                &agent_cfg,
                options.system_prompt.as_deref(),
            ),
        };
        let params = client_defaults.merged_with(&overrides);

        let mut messages = if effective_include_history {
            match self.sessions.get(&session_id) {
                Ok(session) => session.messages,
                Err(_) => Vec::new(),
            }
        } else {
            Vec::new()
        };
        messages.push(Message::user_text(user_message));

        let tool_specs = resolve_tool_specs(
            &self.host,
            &agent_cfg.tool_servers,
            &agent_cfg.excluded_components,
        );

        Ok((
            agent_cfg,
            session_id,
            base_id,
            effective_include_history,
            messages,
            client,
            params,
            tool_specs,
        ))
    }

    pub async fn run_agent(
        &self,
        agent_id: &str,
        user_message: &str,
        options: RunOptions,
        cancellation: CancellationToken,
    ) -> Result<ExecutionResult, AuriteError> {
        let (agent_cfg, session_id, base_id, include_history, messages, client, params, tool_specs) =
            self.prepare_agent_call(agent_id, user_message, &options).await?;

        let system_prompt = params.system_prompt.clone();
        let result = turn_loop::run(
            &agent_cfg,
            messages,
            &self.host,
            client.as_ref(),
            &tool_specs,
            &params,
            system_prompt.as_deref(),
            cancellation,
        )
        .await;

        if include_history {
            if let Err(error) = self.sessions.save_agent(&session_id, &base_id, agent_id, &result) {
                tracing::warn!(%error, session_id, "failed to persist agent session");
            }
        }

        Ok(result)
    }

    /// Drives the Turn-Loop in streaming mode (spec §4.6 "Streaming").
    /// The first event is always `session_info`; the stream ends with
    /// exactly one `stream_end` or one terminal `error` event.
    pub async fn stream_agent(
        &self,
        agent_id: &str,
        user_message: &str,
        options: RunOptions,
        cancellation: CancellationToken,
    ) -> Result<Pin<Box<dyn Stream<Item = EngineEvent> + Send>>, AuriteError> {
        let (agent_cfg, session_id, base_id, include_history, mut messages, client, params, tool_specs) =
            self.prepare_agent_call(agent_id, user_message, &options).await?;

        let host = self.host.clone();
        let sessions = self.sessions.clone();
        let agent_name = agent_id.to_string();
        let system_prompt = params.system_prompt.clone();

        let stream = async_stream::stream! {
            yield EngineEvent::SessionInfo { session_id: session_id.clone() };

            let max_iterations = agent_cfg.max_iterations.max(1);
            let mut final_message: Option<Message> = None;
            let mut terminal_error: Option<String> = None;
            // Set when the terminal error was already forwarded as an
            // `EngineEvent::Error` via the per-event loop below, so the
            // finalization block doesn't yield a second one.
            let mut error_already_emitted = false;

            'turns: for _ in 0..max_iterations {
                if cancellation.is_cancelled() {
                    terminal_error = Some("cancelled".to_string());
                    break 'turns;
                }

                let mut events = match client
                    .stream(&messages, &tool_specs, system_prompt.as_deref(), &params)
                    .await
                {
                    Ok(events) => events,
                    Err(error) => {
                        terminal_error = Some(error.to_string());
                        break 'turns;
                    }
                };

                let mut collected_tool_uses: Vec<(usize, String, String)> = Vec::new();
                let mut tool_inputs: std::collections::HashMap<usize, String> = std::collections::HashMap::new();
                let mut assistant_blocks: Vec<ContentBlock> = Vec::new();
                let mut stop_reason: Option<aurite_llm::StopReason> = None;

                while let Some(event) = events.next().await {
                    match &event {
                        aurite_llm::StreamEvent::ToolUseStart { index, id, name } => {
                            collected_tool_uses.push((*index, id.clone(), name.clone()));
                        }
                        aurite_llm::StreamEvent::ToolUseInputDelta { index, json_chunk } => {
                            tool_inputs
                                .entry(*index)
                                .or_default()
                                .push_str(json_chunk);
                        }
                        aurite_llm::StreamEvent::TextDelta { text, .. } => {
                            assistant_blocks.push(ContentBlock::Text { text: text.clone() });
                        }
                        aurite_llm::StreamEvent::MessageStop { reason, .. } => {
                            stop_reason = Some(*reason);
                        }
                        aurite_llm::StreamEvent::Error { message } => {
                            terminal_error = Some(message.clone());
                            error_already_emitted = true;
                        }
                        aurite_llm::StreamEvent::ContentBlockStop { .. } => {}
                    }
                    yield EngineEvent::from(event);
                }

                if let Some(message) = &terminal_error {
                    let _ = message;
                    break 'turns;
                }

                for (index, id, name) in &collected_tool_uses {
                    let input = tool_inputs
                        .get(index)
                        .and_then(|raw| serde_json::from_str(raw).ok())
                        .unwrap_or(serde_json::Value::Null);
                    assistant_blocks.push(ContentBlock::ToolUse {
                        id: id.clone(),
                        name: name.clone(),
                        input,
                    });
                }

                let assistant_message = Message::assistant(assistant_blocks);
                messages.push(assistant_message.clone());
                if let Err(error) = sessions.append_message(&session_id, &agent_name, assistant_message.clone()) {
                    tracing::warn!(%error, session_id, "failed to durably append assistant message mid-stream");
                }

                let is_tool_use = matches!(stop_reason, Some(aurite_llm::StopReason::ToolUse));

                if !is_tool_use || collected_tool_uses.is_empty() {
                    if is_tool_use && collected_tool_uses.is_empty() {
                        // Malformed turn: stop reason said tool_use but no
                        // tool calls were collected. Continue rather than
                        // terminate (spec §4.5 tie-break).
                        continue 'turns;
                    }
                    final_message = Some(assistant_message);
                    break 'turns;
                }

                let mut tool_result_blocks: Vec<ContentBlock> = Vec::with_capacity(collected_tool_uses.len());
                for (index, id, name) in &collected_tool_uses {
                    let input = tool_inputs
                        .get(index)
                        .and_then(|raw| serde_json::from_str(raw).ok())
                        .unwrap_or(serde_json::Value::Null);
                    let outcome = host.call_tool(name, input, cancellation.clone()).await;
                    yield EngineEvent::ToolResult {
                        tool_use_id: id.clone(),
                        content: outcome.content.clone(),
                        is_error: outcome.is_error,
                    };
                    tool_result_blocks.push(ContentBlock::ToolResult {
                        tool_use_id: id.clone(),
                        content: outcome.content,
                        is_error: outcome.is_error,
                    });
                }

                messages.push(Message::tool_result(tool_result_blocks));
            }

            let result = ExecutionResult {
                status: if terminal_error.is_some() {
                    ExecutionStatus::Error
                } else if final_message.is_some() {
                    ExecutionStatus::Success
                } else {
                    ExecutionStatus::MaxIterations
                },
                conversation: messages.clone(),
                final_message,
                tool_uses_in_final_turn: 0,
                error: terminal_error.clone(),
            };

            if include_history {
                if let Err(error) = sessions.save_agent(&session_id, &base_id, &agent_name, &result) {
                    tracing::warn!(%error, session_id, "failed to persist streamed agent session");
                }
            }

            match terminal_error {
                Some(message) if !error_already_emitted => yield EngineEvent::Error { message },
                Some(_) => {}
                None => yield EngineEvent::StreamEnd,
            }
        };

        Ok(Box::pin(stream))
    }

    pub async fn run_linear_workflow(
        &self,
        workflow_id: &str,
        initial_input: &str,
        options: RunOptions,
        cancellation: CancellationToken,
    ) -> Result<WorkflowResult, AuriteError> {
        let workflow_cfg = self.config.get_linear_workflow(workflow_id)?;

        let session_id = match &options.session_id {
            Some(id) => ensure_prefixed(id, "workflow-"),
            None => new_workflow_session_id(),
        };
        let base_id = session_id.clone();

        let mut current_input = initial_input.to_string();
        let mut steps = Vec::new();

        for step in &workflow_cfg.steps {
            let step_session_id = match step.component_kind.as_str() {
                "linear_workflow" | "custom_workflow" => new_workflow_session_id(),
                _ => new_agent_session_id(),
            };
            let step_options = RunOptions {
                session_id: Some(step_session_id.clone()),
                base_session_id: Some(base_id.clone()),
                force_include_history: None,
                system_prompt: None,
            };

            // Each step's component_kind selects which of the three
            // public run_* operations drives it (spec §4.6: "typically
            // an agent, but possibly another workflow or a custom
            // workflow"); base_id is threaded into every recursive call
            // so nested steps share this workflow's lineage.
            let step_result = match step.component_kind.as_str() {
                // Boxed so the recursive call doesn't make this async
                // fn's own future type infinitely sized.
                "linear_workflow" => Box::pin(self.run_linear_workflow(
                    &step.component_id,
                    &current_input,
                    step_options,
                    cancellation.clone(),
                ))
                .await
                .map(execution_result_from_workflow)
                .map_err(|error| error.to_string()),
                "custom_workflow" => self
                    .run_custom_workflow(
                        &step.component_id,
                        serde_json::Value::String(current_input.clone()),
                        step_options,
                    )
                    .await
                    .map(execution_result_from_json)
                    .map_err(|error| error.to_string()),
                _ => self
                    .run_agent(&step.component_id, &current_input, step_options, cancellation.clone())
                    .await
                    .map_err(|error| error.to_string()),
            };

            let failed = step_result.is_err();
            if let Ok(result) = &step_result {
                if let Some(text) = result.primary_text() {
                    current_input = text;
                }
            }

            steps.push(WorkflowStepResult {
                component_id: step.component_id.clone(),
                session_id: step_session_id,
                result: step_result,
            });

            if failed {
                break;
            }
        }

        let final_output = steps
            .last()
            .and_then(|step| step.result.as_ref().ok())
            .and_then(|result| result.primary_text());

        let result = WorkflowResult {
            session_id: session_id.clone(),
            base_session_id: base_id.clone(),
            steps,
            final_output,
        };

        if let Err(error) = self.sessions.save_workflow(&session_id, &base_id, workflow_id, &result) {
            tracing::warn!(%error, session_id, "failed to persist linear workflow session");
        }

        Ok(result)
    }

    pub async fn run_custom_workflow(
        &self,
        workflow_id: &str,
        initial_input: serde_json::Value,
        options: RunOptions,
    ) -> Result<serde_json::Value, AuriteError> {
        // Only confirms the record exists and is well-formed; the actual
        // entry point is looked up from the in-process registry below
        // (see `custom_workflow.rs` for why Rust can't resolve
        // `module_path`/`class_name` dynamically).
        let _workflow_cfg = self.config.get_custom_workflow(workflow_id)?;

        let workflow = self.workflows.get(workflow_id).ok_or_else(|| AuriteError::ConfigNotFound {
            kind: "custom_workflow_handler".to_string(),
            id: workflow_id.to_string(),
        })?;

        let session_id = match &options.session_id {
            Some(id) => ensure_prefixed(id, "workflow-"),
            None => new_workflow_session_id(),
        };
        let base_id = options.base_session_id.unwrap_or_else(|| session_id.clone());

        let facade = EngineFacade {
            engine: self.clone(),
            base_session_id: base_id,
        };

        workflow
            .run(initial_input, facade, session_id)
            .await
            .map_err(|error| AuriteError::CustomWorkflowFailed {
                workflow_id: workflow_id.to_string(),
                wrapped: error.to_string(),
            })
    }
}

/// Narrowed view of the Engine a custom workflow's entry point is
/// invoked with (spec §4.6: "exposes `run_agent`/`run_linear_workflow`").
#[derive(Clone)]
pub struct EngineFacade {
    engine: Engine,
    base_session_id: String,
}

impl EngineFacade {
    pub async fn run_agent(
        &self,
        agent_id: &str,
        user_message: &str,
        mut options: RunOptions,
        cancellation: CancellationToken,
    ) -> Result<ExecutionResult, AuriteError> {
        options.base_session_id.get_or_insert_with(|| self.base_session_id.clone());
        self.engine.run_agent(agent_id, user_message, options, cancellation).await
    }

    pub async fn run_linear_workflow(
        &self,
        workflow_id: &str,
        initial_input: &str,
        mut options: RunOptions,
        cancellation: CancellationToken,
    ) -> Result<WorkflowResult, AuriteError> {
        options.session_id.get_or_insert_with(|| self.base_session_id.clone());
        self.engine
            .run_linear_workflow(workflow_id, initial_input, options, cancellation)
            .await
    }
}

/// Folds a nested linear-workflow step's result into the same
/// `ExecutionResult` shape an agent step produces, so `primary_text()`
/// keeps working as the step-chaining feed regardless of which kind of
/// component a step names.
fn execution_result_from_workflow(result: WorkflowResult) -> ExecutionResult {
    let failed = result.any_step_failed();
    let final_message = result
        .final_output
        .map(|text| Message::assistant(vec![ContentBlock::Text { text }]));
    ExecutionResult {
        status: if failed { ExecutionStatus::Error } else { ExecutionStatus::Success },
        conversation: final_message.clone().into_iter().collect(),
        final_message,
        tool_uses_in_final_turn: 0,
        error: failed.then(|| "nested linear workflow had a failed step".to_string()),
    }
}

/// Folds a nested custom-workflow step's opaque return value into the
/// same `ExecutionResult` shape an agent step produces. A string value
/// is used verbatim as the fed-forward text; anything else is rendered
/// as JSON.
fn execution_result_from_json(value: serde_json::Value) -> ExecutionResult {
    let text = match value {
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    };
    let final_message = Message::assistant(vec![ContentBlock::Text { text }]);
    ExecutionResult {
        status: ExecutionStatus::Success,
        conversation: vec![final_message.clone()],
        final_message: Some(final_message),
        tool_uses_in_final_turn: 0,
        error: None,
    }
}
