use super::*;
use tempfile::tempdir;

fn write_component(dir: &Path, file_name: &str, contents: &str) {
    std::fs::write(dir.join(file_name), contents).unwrap();
}

#[test]
fn get_returns_not_found_for_unknown_component() {
    let root = tempdir().unwrap();
    let index = ConfigIndex::new_with_global_dir(root.path(), None);
    let err = index.get(ComponentKind::Agent, "missing").unwrap_err();
    assert!(matches!(err, AuriteError::ConfigNotFound { .. }));
}

#[test]
fn loads_agent_component_from_working_dir() {
    let root = tempdir().unwrap();
    write_component(
        root.path(),
        "weather_agent.json",
        r#"{"type": "agent", "name": "weather_agent", "max_iterations": 3}"#,
    );

    let index = ConfigIndex::new_with_global_dir(root.path(), None);
    let agent = index.get_agent("weather_agent").unwrap();
    assert_eq!(agent.max_iterations, 3);
    assert!(agent.include_history);
}

#[test]
fn closer_anchor_root_wins_over_outer_duplicate() {
    let root = tempdir().unwrap();
    std::fs::write(
        root.path().join(".aurite"),
        "[aurite]\ntype = \"workspace\"\n",
    )
    .unwrap();
    write_component(
        root.path(),
        "shared_llm.json",
        r#"{"type": "llm", "name": "shared_llm", "model": "outer-model"}"#,
    );

    let nested = root.path().join("project");
    std::fs::create_dir(&nested).unwrap();
    std::fs::write(
        nested.join(".aurite"),
        "[aurite]\ntype = \"project\"\n",
    )
    .unwrap();
    write_component(
        &nested,
        "shared_llm.json",
        r#"{"type": "llm", "name": "shared_llm", "model": "inner-model"}"#,
    );

    let index = ConfigIndex::new_with_global_dir(&nested, None);
    let llm = index.get_llm("shared_llm").unwrap();
    assert_eq!(llm.model, "inner-model");
}

#[test]
fn programmatic_registration_wins_over_file_record() {
    let root = tempdir().unwrap();
    write_component(
        root.path(),
        "agent_a.json",
        r#"{"type": "agent", "name": "agent_a"}"#,
    );

    let index = ConfigIndex::new_with_global_dir(root.path(), None);
    index
        .register_programmatic(
            ComponentKind::Agent,
            "agent_a",
            serde_json::json!({"name": "agent_a", "max_iterations": 99}),
        )
        .unwrap();

    let agent = index.get_agent("agent_a").unwrap();
    assert_eq!(agent.max_iterations, 99);
}

#[test]
fn registering_the_same_programmatic_key_twice_conflicts() {
    let root = tempdir().unwrap();
    let index = ConfigIndex::new_with_global_dir(root.path(), None);
    index
        .register_programmatic(ComponentKind::Agent, "dup", serde_json::json!({"name": "dup"}))
        .unwrap();
    let err = index
        .register_programmatic(ComponentKind::Agent, "dup", serde_json::json!({"name": "dup"}))
        .unwrap_err();
    assert!(matches!(err, AuriteError::ConfigConflict { .. }));
}

#[test]
fn validate_reports_field_errors_without_bailing_early() {
    let root = tempdir().unwrap();
    write_component(
        root.path(),
        "broken_server.json",
        r#"{"type": "mcp_server", "name": "", "transport": "subprocess", "server_path": "", "timeout_secs": 0}"#,
    );

    let index = ConfigIndex::new_with_global_dir(root.path(), None);
    let (ok, errors) = index.validate(ComponentKind::McpServer, "");
    assert!(!ok);
    let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"server_path"));
    assert!(fields.contains(&"timeout_secs"));
}

#[test]
fn tool_server_relative_path_resolved_against_context_dir() {
    let root = tempdir().unwrap();
    let nested = root.path().join("servers");
    std::fs::create_dir(&nested).unwrap();
    write_component(
        &nested,
        "weather.json",
        r#"{"type": "mcp_server", "name": "weather", "transport": "subprocess", "server_path": "./weather.py"}"#,
    );

    let index = ConfigIndex::new_with_global_dir(&nested, None);
    let server = index.get_tool_server("weather").unwrap();
    match server.transport {
        McpTransport::Subprocess { server_path, .. } => {
            assert!(PathBuf::from(server_path).is_absolute());
        }
        other => panic!("expected subprocess transport, got {other:?}"),
    }
}

#[test]
fn list_deduplicates_across_programmatic_and_file_records() {
    let root = tempdir().unwrap();
    write_component(
        root.path(),
        "agents.json",
        r#"[{"type": "agent", "name": "a"}, {"type": "agent", "name": "b"}]"#,
    );

    let index = ConfigIndex::new_with_global_dir(root.path(), None);
    index
        .register_programmatic(ComponentKind::Agent, "a", serde_json::json!({"name": "a"}))
        .unwrap();

    let agents = index.list(ComponentKind::Agent);
    let ids: Vec<_> = agents.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}
