//! Tool-Server Host (C3): owns the lifetime of every live tool server
//! and routes tool invocations to the right transport session (spec
//! §4.3). Grounded on the teacher's `McpRegistry`, generalized from a
//! single stdio transport to the three this system supports and
//! extended with the five-phase registration pipeline and prompt/
//! resource discovery spec.md asks for beyond the teacher's tools-only
//! hub.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use rmcp::model::CallToolRequestParam;
use tokio_util::sync::CancellationToken;

use aurite_config::ToolServerConfig;
use aurite_core::AuriteError;

use crate::credentials::{CredentialResolver, NoopCredentialResolver};
use crate::discovery::qualify_components;
use crate::mailbox::ServerMailbox;
use crate::result::ToolCallOutcome;
use crate::tool_spec::{PromptSpec, ResourceSpec, ToolSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Registering,
    Ready,
    Failed,
}

struct LiveServer {
    mailbox: ServerMailbox,
    cancellation: CancellationToken,
    status: ServerStatus,
    tool_timeout: Duration,
}

pub struct Host {
    servers: RwLock<HashMap<String, LiveServer>>,
    tools: RwLock<HashMap<String, ToolSpec>>,
    prompts: RwLock<HashMap<String, PromptSpec>>,
    resources: RwLock<HashMap<String, ResourceSpec>>,
    credential_resolver: Arc<dyn CredentialResolver>,
}

impl Default for Host {
    fn default() -> Self {
        Self {
            servers: RwLock::default(),
            tools: RwLock::default(),
            prompts: RwLock::default(),
            resources: RwLock::default(),
            credential_resolver: Arc::new(NoopCredentialResolver),
        }
    }
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a non-default credential resolver, run at the start of
    /// `register` (phase 1, spec §1's `resolve(ClientConfig) -> ClientConfig`).
    pub fn with_credential_resolver(resolver: Arc<dyn CredentialResolver>) -> Self {
        Self {
            credential_resolver: resolver,
            ..Self::default()
        }
    }

    pub fn is_ready(&self, server_id: &str) -> bool {
        self.servers
            .read()
            .expect("host lock poisoned")
            .get(server_id)
            .is_some_and(|server| server.status == ServerStatus::Ready)
    }

    /// Runs the five-phase registration pipeline. If `server_id` is
    /// already registered, the previous `LiveServer` is unregistered
    /// first (spec §4.3 "Name conflicts").
    pub async fn register(&self, config: ToolServerConfig) -> Result<(), AuriteError> {
        let config = self.credential_resolver.resolve(config);
        let server_id = config.name.clone();
        if self.servers.read().expect("host lock poisoned").contains_key(&server_id) {
            self.unregister(&server_id).await;
        }

        let registration_timeout = config.registration_timeout();
        let tool_timeout = config.timeout();
        let cancellation = CancellationToken::new();
        let mailbox = ServerMailbox::spawn(config);

        {
            let mut servers = self.servers.write().expect("host lock poisoned");
            servers.insert(
                server_id.clone(),
                LiveServer {
                    mailbox: mailbox.clone(),
                    cancellation: cancellation.clone(),
                    status: ServerStatus::Registering,
                    tool_timeout,
                },
            );
        }

        let outcome = self
            .run_registration(&server_id, &mailbox, cancellation.clone(), registration_timeout)
            .await;

        match outcome {
            Ok(()) => {
                if let Some(server) = self.servers.write().expect("host lock poisoned").get_mut(&server_id) {
                    server.status = ServerStatus::Ready;
                }
                Ok(())
            }
            Err((phase, reason)) => {
                if let Some(server) = self.servers.write().expect("host lock poisoned").get_mut(&server_id) {
                    server.status = ServerStatus::Failed;
                }
                mailbox.shutdown().await;
                self.servers.write().expect("host lock poisoned").remove(&server_id);
                Err(AuriteError::ToolServerRegistrationFailed {
                    server_id,
                    phase: phase.to_string(),
                    reason,
                })
            }
        }
    }

    async fn run_registration(
        &self,
        server_id: &str,
        mailbox: &ServerMailbox,
        cancellation: CancellationToken,
        registration_timeout: Duration,
    ) -> Result<(), (&'static str, String)> {
        tokio::time::timeout(registration_timeout, mailbox.connect(cancellation.clone()))
            .await
            .map_err(|_| ("transport_establishment", "timed out".to_string()))?
            .map_err(|error| ("transport_establishment", error.to_string()))?;

        let components = tokio::time::timeout(registration_timeout, mailbox.discover(cancellation))
            .await
            .map_err(|_| ("component_discovery", "timed out".to_string()))?
            .map_err(|error| ("component_discovery", error.to_string()))?;

        let components = qualify_components(server_id, components);

        let mut tools = self.tools.write().expect("host lock poisoned");
        for tool in components.tools {
            tools.insert(tool.qualified_name.clone(), tool);
        }
        drop(tools);

        let mut prompts = self.prompts.write().expect("host lock poisoned");
        for prompt in components.prompts {
            prompts.insert(prompt.qualified_name.clone(), prompt);
        }
        drop(prompts);

        let mut resources = self.resources.write().expect("host lock poisoned");
        for resource in components.resources {
            resources.insert(resource.qualified_name.clone(), resource);
        }

        Ok(())
    }

    /// Idempotent: unregistering a server id that isn't live is a no-op.
    pub async fn unregister(&self, server_id: &str) {
        let removed = self.servers.write().expect("host lock poisoned").remove(server_id);
        let Some(server) = removed else {
            return;
        };
        server.cancellation.cancel();
        server.mailbox.shutdown().await;

        self.tools
            .write()
            .expect("host lock poisoned")
            .retain(|_, tool| tool.server_id != server_id);
        self.prompts
            .write()
            .expect("host lock poisoned")
            .retain(|_, prompt| prompt.server_id != server_id);
        self.resources
            .write()
            .expect("host lock poisoned")
            .retain(|_, resource| resource.server_id != server_id);
    }

    pub fn tool_specs(&self, server_ids: &[String]) -> Vec<ToolSpec> {
        self.tools
            .read()
            .expect("host lock poisoned")
            .values()
            .filter(|tool| server_ids.iter().any(|id| id == &tool.server_id))
            .cloned()
            .collect()
    }

    /// Never returns `Err` for tool-side failures — an unroutable name
    /// or a transport error both come back as `ToolCallOutcome{is_error:
    /// true}` (spec §4.3 "the Host must not throw on tool-side errors").
    pub async fn call_tool(
        &self,
        qualified_name: &str,
        arguments: serde_json::Value,
        cancellation: CancellationToken,
    ) -> ToolCallOutcome {
        let route = {
            let tools = self.tools.read().expect("host lock poisoned");
            tools.get(qualified_name).map(|tool| (tool.server_id.clone(), tool.original_name.clone()))
        };
        let Some((server_id, original_name)) = route else {
            return ToolCallOutcome::error(format!("no tool registered as '{qualified_name}'"));
        };

        let (mailbox, tool_timeout) = {
            let servers = self.servers.read().expect("host lock poisoned");
            match servers.get(&server_id) {
                Some(server) => (server.mailbox.clone(), server.tool_timeout),
                None => return ToolCallOutcome::error(format!("server '{server_id}' is not live")),
            }
        };

        let arguments_map = match arguments {
            serde_json::Value::Object(map) => Some(map),
            serde_json::Value::Null => None,
            other => {
                return ToolCallOutcome::error(format!(
                    "tool arguments must be a JSON object, got {other}"
                ));
            }
        };

        let request = CallToolRequestParam {
            name: original_name.into(),
            arguments: arguments_map,
        };

        let call = mailbox.call_tool(request, cancellation);
        match tokio::time::timeout(tool_timeout, call).await {
            Ok(Ok(result)) => result.into(),
            Ok(Err(error)) => ToolCallOutcome::error(error.to_string()),
            Err(_) => ToolCallOutcome::error(format!("tool '{qualified_name}' timed out")),
        }
    }

    /// Cancels every `LiveServer` concurrently and awaits completion
    /// with a deadline (spec §4.3 "Shutdown").
    pub async fn shutdown(&self, deadline: Duration) {
        let servers: Vec<(String, LiveServer)> =
            self.servers.write().expect("host lock poisoned").drain().collect();

        let shutdowns = servers.into_iter().map(|(_, server)| async move {
            server.cancellation.cancel();
            server.mailbox.shutdown().await;
        });

        if tokio::time::timeout(deadline, futures::future::join_all(shutdowns))
            .await
            .is_err()
        {
            tracing::warn!("tool server host shutdown exceeded its deadline");
        }

        self.tools.write().expect("host lock poisoned").clear();
        self.prompts.write().expect("host lock poisoned").clear();
        self.resources.write().expect("host lock poisoned").clear();
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
