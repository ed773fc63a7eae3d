//! Restart-with-backoff wrapper around a single server's transport
//! (spec §4.3; grounded on the teacher's `ManagedServer`). Owns the
//! config, lazily connects on first use, and re-establishes the
//! transport with exponential backoff when a call fails.

use std::time::Duration;

use anyhow::{Result, anyhow};
use aurite_config::ToolServerConfig;
use rmcp::model::{CallToolRequestParam, CallToolResult};

use crate::discovery::{self, DiscoveredComponents};
use crate::transport::BackendTransport;

const RESTART_BACKOFF_INITIAL_MS: u64 = 100;
const RESTART_BACKOFF_MAX_MS: u64 = 30_000;
const MAX_ATTEMPTS: u32 = 3;

pub struct ManagedServer {
    config: ToolServerConfig,
    transport: Option<BackendTransport>,
    restart_backoff: Duration,
}

impl ManagedServer {
    pub fn new(config: ToolServerConfig) -> Self {
        Self {
            config,
            transport: None,
            restart_backoff: Duration::from_millis(RESTART_BACKOFF_INITIAL_MS),
        }
    }

    pub async fn connect(&mut self) -> Result<()> {
        self.ensure_running().await
    }

    pub async fn discover(&mut self) -> DiscoveredComponents {
        discovery::discover(self.transport.as_ref().map(|t| t.service())).await
    }

    pub async fn call_tool(&mut self, request: CallToolRequestParam) -> Result<CallToolResult> {
        let mut last_err = None;
        for _ in 0..MAX_ATTEMPTS {
            if let Err(error) = self.ensure_running().await {
                last_err = Some(error);
                self.restart_after_failure().await;
                continue;
            }
            if let Some(transport) = self.transport.as_ref() {
                match transport.service().call_tool(request.clone()).await {
                    Ok(response) => {
                        self.restart_backoff = Duration::from_millis(RESTART_BACKOFF_INITIAL_MS);
                        return Ok(response);
                    }
                    Err(error) => {
                        tracing::warn!(server = %self.config.name, %error, "tool call failed, restarting transport");
                        last_err = Some(anyhow!(error));
                        self.restart_after_failure().await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow!("call_tool failed without explicit error")))
    }

    pub async fn shutdown(&mut self) {
        if let Some(transport) = self.transport.take() {
            transport.shutdown().await;
        }
    }

    async fn ensure_running(&mut self) -> Result<()> {
        if self.transport.is_some() {
            return Ok(());
        }
        self.transport = Some(BackendTransport::connect(&self.config).await?);
        Ok(())
    }

    async fn restart_after_failure(&mut self) {
        if let Some(transport) = self.transport.take() {
            transport.shutdown().await;
        }
        tokio::time::sleep(self.restart_backoff).await;
        self.restart_backoff =
            (self.restart_backoff * 2).min(Duration::from_millis(RESTART_BACKOFF_MAX_MS));
    }
}
