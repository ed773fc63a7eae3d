//! Resolves an `LlmConfig` record to a concrete `ModelClient` (spec
//! §4.6 step 4), grounded on the teacher's `TransportFactory::create`
//! factory-construction idiom and `Executor::from_spec`'s
//! config-to-backend resolution.

use std::sync::Arc;

use aurite_config::LlmConfig;
use aurite_core::AuriteError;
use aurite_llm::{AnthropicClient, ModelClient, ModelParams};

const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

pub struct ModelClientFactory;

impl ModelClientFactory {
    pub fn create(llm: &LlmConfig) -> Result<Arc<dyn ModelClient>, AuriteError> {
        match llm.provider.as_str() {
            "anthropic" => {
                let api_key_env = llm.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV);
                let api_key = std::env::var(api_key_env).map_err(|_| AuriteError::ModelClientFailed {
                    reason: format!("missing environment variable '{api_key_env}' for llm '{}'", llm.name),
                    retryable: false,
                })?;
                let defaults = ModelParams {
                    model: Some(llm.model.clone()),
                    temperature: llm.temperature,
                    max_tokens: llm.max_tokens,
                    system_prompt: llm.system_prompt.clone(),
                };
                let mut client = AnthropicClient::new(api_key, defaults);
                if let Some(base_url) = &llm.base_url {
                    client = client.with_base_url(base_url.clone());
                }
                Ok(Arc::new(client))
            }
            other => Err(AuriteError::ConfigInvalid {
                kind: "llm".to_string(),
                id: llm.name.clone(),
                errors: vec![format!("unsupported model provider '{other}'")],
            }),
        }
    }
}
