use super::*;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn call_tool_on_unknown_qualified_name_is_data_not_an_error() {
    let host = Host::new();
    let outcome = host
        .call_tool("missing-server-tool", serde_json::json!({}), CancellationToken::new())
        .await;
    assert!(outcome.is_error);
}

#[tokio::test]
async fn is_ready_is_false_for_unknown_server() {
    let host = Host::new();
    assert!(!host.is_ready("nonexistent"));
}

#[tokio::test]
async fn unregister_is_idempotent_for_unknown_server() {
    let host = Host::new();
    host.unregister("nonexistent").await;
    host.unregister("nonexistent").await;
}

#[tokio::test]
async fn shutdown_with_no_registered_servers_completes_immediately() {
    let host = Host::new();
    host.shutdown(std::time::Duration::from_millis(50)).await;
}
