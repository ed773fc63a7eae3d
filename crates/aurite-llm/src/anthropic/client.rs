//! A concrete `ModelClient` over the Anthropic Messages API via
//! `reqwest`. Retries once on a transient failure (HTTP 429/5xx or a
//! connection-level error) per spec §7's `ModelClientFailed{retryable}`.

use async_trait::async_trait;

use aurite_core::{AuriteError, Message};

use crate::anthropic::wire::{
    self, WireRequest, WireResponse, ANTHROPIC_VERSION, DEFAULT_BASE_URL, MESSAGES_PATH,
};
use crate::client::{EventStream, ModelClient};
use crate::params::{ModelParams, ToolSpec};
use crate::synthesize::synthesize_events;

const DEFAULT_MAX_TOKENS: u32 = 4096;

pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    defaults: ModelParams,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, defaults: ModelParams) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            defaults,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn resolve(&self, params: &ModelParams, system_prompt: Option<&str>) -> (String, u32, Option<f32>, Option<String>) {
        let effective = self.defaults.merged_with(params);
        let model = effective.model.unwrap_or_else(|| "claude-3-5-sonnet-latest".to_string());
        let max_tokens = effective.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
        let system = system_prompt
            .map(str::to_string)
            .or(effective.system_prompt);
        (model, max_tokens, effective.temperature, system)
    }

    async fn send_request(&self, body: &WireRequest) -> Result<WireResponse, AuriteError> {
        let url = format!("{}{}", self.base_url, MESSAGES_PATH);
        let mut attempts = 0;
        loop {
            attempts += 1;
            let result = self
                .http
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(body)
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<WireResponse>().await.map_err(|error| {
                            AuriteError::ModelClientFailed {
                                reason: format!("failed to parse response body: {error}"),
                                retryable: false,
                            }
                        });
                    }
                    let retryable = status.as_u16() == 429 || status.is_server_error();
                    let text = response.text().await.unwrap_or_default();
                    if retryable && attempts < 2 {
                        tracing::warn!(status = %status, "anthropic request failed, retrying once");
                        continue;
                    }
                    return Err(AuriteError::ModelClientFailed {
                        reason: format!("anthropic returned {status}: {text}"),
                        retryable,
                    });
                }
                Err(error) => {
                    let retryable = error.is_connect() || error.is_timeout();
                    if retryable && attempts < 2 {
                        tracing::warn!(error = %error, "anthropic request errored, retrying once");
                        continue;
                    }
                    return Err(AuriteError::ModelClientFailed {
                        reason: error.to_string(),
                        retryable,
                    });
                }
            }
        }
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    async fn complete(
        &self,
        messages: &[Message],
        tool_specs: &[ToolSpec],
        system_prompt: Option<&str>,
        params: &ModelParams,
    ) -> Result<Message, AuriteError> {
        let (model, max_tokens, temperature, system) = self.resolve(params, system_prompt);
        let request = WireRequest {
            model,
            max_tokens,
            messages: wire::to_wire_messages(messages),
            system,
            temperature,
            tools: wire::to_wire_tools(tool_specs),
        };

        let response = self.send_request(&request).await?;
        let blocks = wire::from_wire_blocks(response.content);
        Ok(Message::assistant(blocks))
    }

    async fn stream(
        &self,
        messages: &[Message],
        tool_specs: &[ToolSpec],
        system_prompt: Option<&str>,
        params: &ModelParams,
    ) -> Result<EventStream, AuriteError> {
        let (model, max_tokens, temperature, system) = self.resolve(params, system_prompt);
        let request = WireRequest {
            model,
            max_tokens,
            messages: wire::to_wire_messages(messages),
            system,
            temperature,
            tools: wire::to_wire_tools(tool_specs),
        };

        let response = self.send_request(&request).await?;
        let stop_reason = wire::stop_reason_from_wire(response.stop_reason.as_deref());
        let usage = response.usage.map(|usage| crate::stream_event::Usage {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
        });
        let blocks = wire::from_wire_blocks(response.content);
        let message = Message::assistant(blocks);
        let events = synthesize_events(&message, stop_reason, usage);

        Ok(Box::pin(futures::stream::iter(events)))
    }
}
