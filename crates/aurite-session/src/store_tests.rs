use super::*;
use aurite_core::{ExecutionStatus, Message, WorkflowStepResult};
use tempfile::tempdir;

fn sample_result() -> ExecutionResult {
    ExecutionResult {
        status: ExecutionStatus::Success,
        conversation: vec![Message::user_text("hi"), Message::assistant(vec![])],
        final_message: Some(Message::assistant(vec![])),
        tool_uses_in_final_turn: 0,
        error: None,
    }
}

#[test]
fn save_agent_creates_a_file_and_sets_message_count() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    let session = store
        .save_agent("agent-aaaaaaaa", "agent-aaaaaaaa", "weather_agent", &sample_result())
        .unwrap();
    assert_eq!(session.message_count, Some(2));
    assert!(dir.path().join("agent-aaaaaaaa.json").exists());
}

#[test]
fn save_agent_preserves_created_at_on_update() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    let first = store
        .save_agent("agent-aaaaaaaa", "agent-aaaaaaaa", "weather_agent", &sample_result())
        .unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));
    let second = store
        .save_agent("agent-aaaaaaaa", "agent-aaaaaaaa", "weather_agent", &sample_result())
        .unwrap();
    assert_eq!(first.created_at, second.created_at);
    assert!(second.last_updated >= first.last_updated);
}

#[test]
fn append_message_is_durable_without_a_final_save() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    store
        .append_message("agent-bbbbbbbb", "weather_agent", Message::user_text("hi"))
        .unwrap();
    store
        .append_message("agent-bbbbbbbb", "weather_agent", Message::user_text("again"))
        .unwrap();
    let session = store.get("agent-bbbbbbbb").unwrap();
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.message_count, Some(2));
}

#[test]
fn get_by_exact_id_hits_without_scanning() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    store
        .save_agent("agent-aaaaaaaa", "agent-aaaaaaaa", "a", &sample_result())
        .unwrap();
    let session = store.get("agent-aaaaaaaa").unwrap();
    assert_eq!(session.id, "agent-aaaaaaaa");
}

#[test]
fn get_by_base_id_resolves_unique_child() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    store
        .save_agent("agent-child001", "workflow-root01", "step_one", &sample_result())
        .unwrap();
    let session = store.get("workflow-root01").unwrap();
    assert_eq!(session.id, "agent-child001");
}

#[test]
fn get_by_base_id_is_ambiguous_with_multiple_children() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    store
        .save_agent("agent-child001", "workflow-root01", "step_one", &sample_result())
        .unwrap();
    store
        .save_agent("agent-child002", "workflow-root01", "step_two", &sample_result())
        .unwrap();
    let err = store.get("workflow-root01").unwrap_err();
    match err {
        AuriteError::AmbiguousPartialId { candidates, .. } => assert_eq!(candidates.len(), 2),
        other => panic!("expected AmbiguousPartialId, got {other:?}"),
    }
}

#[test]
fn get_missing_session_is_not_found() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    let err = store.get("agent-nope0000").unwrap_err();
    assert!(matches!(err, AuriteError::SessionNotFound(_)));
}

#[test]
fn list_sorts_by_last_updated_descending_and_paginates() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    store
        .save_agent("agent-1", "agent-1", "a", &sample_result())
        .unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));
    store
        .save_agent("agent-2", "agent-2", "b", &sample_result())
        .unwrap();

    let (total, page) = store.list(&SessionFilter::default(), 0, 1);
    assert_eq!(total, 2);
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, "agent-2");
}

#[test]
fn list_filters_by_agent_name() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    store
        .save_agent("agent-1", "agent-1", "weather_agent", &sample_result())
        .unwrap();
    store
        .save_agent("agent-2", "agent-2", "other_agent", &sample_result())
        .unwrap();

    let filter = SessionFilter {
        agent_name: Some("weather_agent".to_string()),
        workflow_name: None,
    };
    let (total, page) = store.list(&filter, 0, 10);
    assert_eq!(total, 1);
    assert_eq!(page[0].id, "agent-1");
}

#[test]
fn delete_workflow_cascades_to_child_agent_sessions() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path());

    let workflow_result = WorkflowResult {
        session_id: "workflow-root01".to_string(),
        base_session_id: "workflow-root01".to_string(),
        steps: vec![WorkflowStepResult {
            component_id: "step_one".to_string(),
            session_id: "agent-child001".to_string(),
            result: Ok(sample_result()),
        }],
        final_output: Some("done".to_string()),
    };
    store
        .save_workflow("workflow-root01", "workflow-root01", "my_workflow", &workflow_result)
        .unwrap();
    store
        .save_agent("agent-child001", "workflow-root01", "step_one", &sample_result())
        .unwrap();

    store.delete("workflow-root01").unwrap();

    assert!(store.get("workflow-root01").is_err());
    assert!(store.get("agent-child001").is_err());
}

#[test]
fn delete_child_agent_removes_it_from_parent_workflow() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path());

    let workflow_result = WorkflowResult {
        session_id: "workflow-root02".to_string(),
        base_session_id: "workflow-root02".to_string(),
        steps: vec![WorkflowStepResult {
            component_id: "step_one".to_string(),
            session_id: "agent-child002".to_string(),
            result: Ok(sample_result()),
        }],
        final_output: None,
    };
    store
        .save_workflow("workflow-root02", "workflow-root02", "my_workflow", &workflow_result)
        .unwrap();
    store
        .save_agent("agent-child002", "workflow-root02", "step_one", &sample_result())
        .unwrap();

    store.delete("agent-child002").unwrap();

    let workflow = store.get("workflow-root02").unwrap();
    assert!(!workflow.agents_involved.contains_key("agent-child002"));
}

#[test]
fn cleanup_removes_sessions_beyond_max_sessions_cap() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    for i in 0..5 {
        store
            .save_agent(&format!("agent-{i}"), &format!("agent-{i}"), "a", &sample_result())
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
    }

    let deleted = store.cleanup(None, Some(2)).unwrap();
    assert_eq!(deleted.len(), 3);
    let (total, _) = store.list(&SessionFilter::default(), 0, 100);
    assert_eq!(total, 2);
}

#[test]
fn cleanup_removes_age_expired_sessions() {
    let dir = tempdir().unwrap();
    let aged = Utc::now() - chrono::Duration::days(40);
    std::fs::write(
        dir.path().join("agent-old00001.json"),
        serde_json::json!({
            "id": "agent-old00001",
            "base_id": "agent-old00001",
            "kind": "agent",
            "name": "a",
            "created_at": aged,
            "last_updated": aged,
            "message_count": 0,
            "agents_involved": {},
            "messages": [],
            "result": null
        })
        .to_string(),
    )
    .unwrap();

    let store = SessionStore::new(dir.path());
    let deleted = store.cleanup(Some(30), None).unwrap();
    assert_eq!(deleted, vec!["agent-old00001".to_string()]);
    assert!(store.get("agent-old00001").is_err());
}

#[test]
fn cleanup_leaves_fresh_sessions_alone() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    store
        .save_agent("agent-fresh001", "agent-fresh001", "a", &sample_result())
        .unwrap();

    let deleted = store.cleanup(Some(30), None).unwrap();
    assert!(deleted.is_empty());
    assert!(store.get("agent-fresh001").is_ok());
}

#[test]
fn legacy_session_without_message_count_is_repaired_on_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("agent-legacy1.json");
    std::fs::write(
        &path,
        serde_json::json!({
            "id": "agent-legacy1",
            "base_id": "agent-legacy1",
            "kind": "agent",
            "name": "legacy_agent",
            "created_at": Utc::now(),
            "last_updated": Utc::now(),
            "messages": [
                {"role": "user", "blocks": [{"type": "text", "text": "hi"}]}
            ]
        })
        .to_string(),
    )
    .unwrap();

    let store = SessionStore::new(dir.path());
    let session = store.get("agent-legacy1").unwrap();
    assert_eq!(session.message_count, Some(1));
}
