//! The credential/secret resolution contract point (spec §1: "a pure
//! function `resolve(ClientConfig) -> ClientConfig`"), realized here as
//! a trait so the registration pipeline's phase 1 ("Config resolution")
//! has a concrete seam to call through. A real implementation — vault
//! lookups, an environment-backed secret store, whatever the deploying
//! application needs — is an external collaborator's job per spec §1;
//! this crate only ships the no-op default so phase 1 is demonstrably
//! wired rather than merely described.

use aurite_config::ToolServerConfig;

pub trait CredentialResolver: Send + Sync {
    fn resolve(&self, config: ToolServerConfig) -> ToolServerConfig;
}

/// Returns `config` unchanged. The `{NAME}` placeholder substitution
/// `substitution.rs` performs at transport establishment (phase 2) is
/// independent of this hook and still runs regardless of which
/// resolver is installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCredentialResolver;

impl CredentialResolver for NoopCredentialResolver {
    fn resolve(&self, config: ToolServerConfig) -> ToolServerConfig {
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurite_config::{McpTransport, ToolServerConfig};

    #[test]
    fn noop_resolver_returns_config_unchanged() {
        let config = ToolServerConfig {
            name: "weather_server".to_string(),
            transport: McpTransport::Subprocess {
                server_path: "./w.py".to_string(),
                args: vec![],
            },
            capabilities: vec![],
            timeout_secs: 30,
            registration_timeout_secs: 20,
            env: Default::default(),
        };
        let resolved = NoopCredentialResolver.resolve(config.clone());
        assert_eq!(resolved.name, config.name);
    }
}
