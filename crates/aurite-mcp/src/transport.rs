//! Transport establishment (spec §4.3 phase 2): subprocess, arbitrary
//! command line, or a streaming HTTP connection. All three yield a
//! paired read/write channel behind a scoped owner that guarantees
//! release on `shutdown` — grounded on the teacher's `BackendTransport`
//! (`csa-mcp-hub::registry`), trimmed to the transports this system
//! supports and without the teacher's process sandboxing (out of scope
//! here; see SPEC_FULL.md Non-goals).

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use aurite_config::{McpTransport, ToolServerConfig};
use rmcp::RoleClient;
use rmcp::service::{RunningService, ServiceExt};
use tokio::process::Command;

use crate::substitution::{substitute, substitute_map};

const SHUTDOWN_GRACE_SECS: u64 = 3;

pub enum BackendTransport {
    Process {
        service: RunningService<RoleClient, ()>,
        child: Box<tokio::process::Child>,
    },
    Http {
        service: RunningService<RoleClient, ()>,
    },
}

impl BackendTransport {
    pub async fn connect(config: &ToolServerConfig) -> Result<Self> {
        match &config.transport {
            McpTransport::Subprocess { server_path, args } => {
                let resolved_args: Vec<String> =
                    args.iter().map(|arg| substitute(arg, &config.env)).collect();
                Self::spawn_process(server_path, &resolved_args, config).await
            }
            McpTransport::Command { command, args } => {
                let resolved_command = substitute(command, &config.env);
                let resolved_args: Vec<String> =
                    args.iter().map(|arg| substitute(arg, &config.env)).collect();
                Self::spawn_process(&resolved_command, &resolved_args, config).await
            }
            McpTransport::HttpStream {
                http_endpoint,
                headers,
            } => {
                let resolved_endpoint = substitute(http_endpoint, &config.env);
                let resolved_headers = substitute_map(headers, &config.env);
                Self::connect_http(&resolved_endpoint, &resolved_headers, config).await
            }
        }
    }

    pub fn service(&self) -> &RunningService<RoleClient, ()> {
        match self {
            Self::Process { service, .. } => service,
            Self::Http { service } => service,
        }
    }

    pub async fn shutdown(self) {
        match self {
            Self::Process { service, mut child } => {
                let _ = service.cancel().await;
                match tokio::time::timeout(Duration::from_secs(SHUTDOWN_GRACE_SECS), child.wait())
                    .await
                {
                    Ok(Ok(_)) => {}
                    Ok(Err(error)) => {
                        tracing::debug!(%error, "failed to wait MCP child process");
                    }
                    Err(_) => {
                        let _ = child.kill().await;
                    }
                }
            }
            Self::Http { service } => {
                let _ = service.cancel().await;
            }
        }
    }

    async fn spawn_process(command: &str, args: &[String], config: &ToolServerConfig) -> Result<Self> {
        let mut cmd = Command::new(command);
        cmd.args(args);
        for (key, value) in &config.env {
            cmd.env(key, substitute(value, &config.env));
        }
        cmd.stdout(std::process::Stdio::piped());
        cmd.stdin(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn tool server '{}'", config.name))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("failed to capture stdout for tool server '{}'", config.name))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("failed to capture stdin for tool server '{}'", config.name))?;
        if let Some(mut stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut sink = tokio::io::sink();
                let _ = tokio::io::copy(&mut stderr, &mut sink).await;
            });
        }

        let service = ()
            .serve((stdout, stdin))
            .await
            .with_context(|| format!("failed to complete MCP handshake with '{}'", config.name))?;

        Ok(Self::Process {
            service,
            child: Box::new(child),
        })
    }

    async fn connect_http(
        endpoint: &str,
        headers: &std::collections::HashMap<String, String>,
        config: &ToolServerConfig,
    ) -> Result<Self> {
        use rmcp::transport::StreamableHttpClientTransport;
        use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;

        tracing::info!(server = %config.name, endpoint, "connecting to HTTP tool server");

        let transport = if headers.is_empty() {
            StreamableHttpClientTransport::from_uri(endpoint.to_string())
        } else {
            let mut header_map = reqwest::header::HeaderMap::new();
            for (key, value) in headers {
                let name = reqwest::header::HeaderName::from_bytes(key.as_bytes())
                    .with_context(|| format!("invalid header name '{key}' for tool server '{}'", config.name))?;
                let value = reqwest::header::HeaderValue::from_str(value)
                    .with_context(|| format!("invalid header value for '{key}' on tool server '{}'", config.name))?;
                header_map.insert(name, value);
            }
            let client = reqwest::Client::builder()
                .default_headers(header_map)
                .build()
                .with_context(|| format!("failed to build HTTP client for tool server '{}'", config.name))?;
            StreamableHttpClientTransport::with_client(
                client,
                StreamableHttpClientTransportConfig::with_uri(endpoint.to_string()),
            )
        };

        let service: RunningService<RoleClient, ()> = ().serve(transport).await.with_context(|| {
            format!(
                "failed to connect to HTTP tool server '{}' at {endpoint}",
                config.name
            )
        })?;

        Ok(Self::Http { service })
    }
}
