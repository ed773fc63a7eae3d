//! Call parameters (spec §4.4: "resolved by the Engine with per-call
//! overrides winning over per-client defaults").

#[derive(Debug, Clone, Default)]
pub struct ModelParams {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub system_prompt: Option<String>,
}

impl ModelParams {
    /// `other`'s fields win wherever present; `self` supplies the
    /// fallback. The Engine calls this as `client_defaults.merged_with(
    /// per_call_overrides)`.
    pub fn merged_with(&self, other: &ModelParams) -> ModelParams {
        ModelParams {
            model: other.model.clone().or_else(|| self.model.clone()),
            temperature: other.temperature.or(self.temperature),
            max_tokens: other.max_tokens.or(self.max_tokens),
            system_prompt: other.system_prompt.clone().or_else(|| self.system_prompt.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_call_override_wins_over_client_default() {
        let defaults = ModelParams {
            model: Some("claude-default".into()),
            temperature: Some(0.2),
            max_tokens: Some(1024),
            system_prompt: None,
        };
        let overrides = ModelParams {
            model: None,
            temperature: Some(0.9),
            max_tokens: None,
            system_prompt: Some("be terse".into()),
        };
        let merged = defaults.merged_with(&overrides);
        assert_eq!(merged.model.as_deref(), Some("claude-default"));
        assert_eq!(merged.temperature, Some(0.9));
        assert_eq!(merged.max_tokens, Some(1024));
        assert_eq!(merged.system_prompt.as_deref(), Some("be terse"));
    }
}
