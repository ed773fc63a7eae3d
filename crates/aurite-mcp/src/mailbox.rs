//! Single-writer mailbox serializing access to one live server's
//! transport session (spec §5: "`LiveServer` sessions are
//! single-writer"). Grounded on the teacher's `ServerQueueHandle`.

use anyhow::{Context, Result, anyhow};
use aurite_config::ToolServerConfig;
use rmcp::model::{CallToolRequestParam, CallToolResult};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::discovery::DiscoveredComponents;
use crate::managed::ManagedServer;

const REQUEST_QUEUE_CAPACITY: usize = 64;

pub enum MailboxCommandKind {
    Connect,
    Discover,
    CallTool(CallToolRequestParam),
    Shutdown,
}

struct MailboxCommand {
    kind: MailboxCommandKind,
    cancellation: CancellationToken,
    response: oneshot::Sender<Result<MailboxResponse>>,
}

pub enum MailboxResponse {
    Connected,
    Discovered(DiscoveredComponents),
    CallTool(CallToolResult),
    ShutDown,
}

#[derive(Clone)]
pub struct ServerMailbox {
    server_name: String,
    sender: mpsc::Sender<MailboxCommand>,
}

impl ServerMailbox {
    pub fn spawn(config: ToolServerConfig) -> Self {
        let server_name = config.name.clone();
        let (sender, mut receiver) = mpsc::channel::<MailboxCommand>(REQUEST_QUEUE_CAPACITY);
        let worker_name = server_name.clone();

        tokio::spawn(async move {
            let mut server = ManagedServer::new(config);

            while let Some(command) = receiver.recv().await {
                match command.kind {
                    MailboxCommandKind::Shutdown => {
                        let _ = command.response.send(Ok(MailboxResponse::ShutDown));
                        break;
                    }
                    MailboxCommandKind::Connect => {
                        let result = Self::dispatch(command.cancellation, async {
                            server.connect().await.map(|_| MailboxResponse::Connected)
                        })
                        .await;
                        let _ = command.response.send(result);
                    }
                    MailboxCommandKind::Discover => {
                        let result = Self::dispatch(command.cancellation, async {
                            Ok(MailboxResponse::Discovered(server.discover().await))
                        })
                        .await;
                        let _ = command.response.send(result);
                    }
                    MailboxCommandKind::CallTool(request) => {
                        let result = Self::dispatch(command.cancellation, async {
                            server.call_tool(request).await.map(MailboxResponse::CallTool)
                        })
                        .await;
                        let _ = command.response.send(result);
                    }
                }
            }

            server.shutdown().await;
            tracing::debug!(server = %worker_name, "tool server mailbox worker stopped");
        });

        Self { server_name, sender }
    }

    async fn dispatch<F>(cancellation: CancellationToken, action: F) -> Result<MailboxResponse>
    where
        F: std::future::Future<Output = Result<MailboxResponse>>,
    {
        tokio::select! {
            _ = cancellation.cancelled() => Err(anyhow!("request cancelled before dispatch")),
            response = action => response,
        }
    }

    pub async fn connect(&self, cancellation: CancellationToken) -> Result<()> {
        match self.request(MailboxCommandKind::Connect, cancellation).await? {
            MailboxResponse::Connected => Ok(()),
            _ => Err(anyhow!("unexpected mailbox response to connect")),
        }
    }

    pub async fn discover(&self, cancellation: CancellationToken) -> Result<DiscoveredComponents> {
        match self.request(MailboxCommandKind::Discover, cancellation).await? {
            MailboxResponse::Discovered(components) => Ok(components),
            _ => Err(anyhow!("unexpected mailbox response to discover")),
        }
    }

    pub async fn call_tool(
        &self,
        request: CallToolRequestParam,
        cancellation: CancellationToken,
    ) -> Result<CallToolResult> {
        match self
            .request(MailboxCommandKind::CallTool(request), cancellation)
            .await?
        {
            MailboxResponse::CallTool(result) => Ok(result),
            _ => Err(anyhow!("unexpected mailbox response to call_tool")),
        }
    }

    pub async fn shutdown(&self) {
        let cancellation = CancellationToken::new();
        let _ = self.request(MailboxCommandKind::Shutdown, cancellation).await;
    }

    async fn request(
        &self,
        kind: MailboxCommandKind,
        cancellation: CancellationToken,
    ) -> Result<MailboxResponse> {
        if cancellation.is_cancelled() {
            return Err(anyhow!("request cancelled before enqueue"));
        }

        let (response_tx, response_rx) = oneshot::channel();
        let command = MailboxCommand {
            kind,
            cancellation: cancellation.clone(),
            response: response_tx,
        };

        tokio::select! {
            _ = cancellation.cancelled() => {
                return Err(anyhow!("request cancelled while waiting for mailbox slot"));
            }
            send_result = self.sender.send(command) => {
                send_result.with_context(|| format!("tool server mailbox stopped: {}", self.server_name))?;
            }
        }

        tokio::select! {
            _ = cancellation.cancelled() => Err(anyhow!("request cancelled while awaiting response")),
            response = response_rx => response.context("mailbox worker dropped response channel")?,
        }
    }
}
