//! The published index: `get`/`list`/`validate`, programmatic
//! registration, and the refresh knob (spec §4.1 "Indexing" /
//! "Refresh" / "Validation API").

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};

use aurite_core::AuriteError;

use crate::discovery::{self, SourceRoot};
use crate::record::{ComponentKind, ComponentRecord, ContextLevel};
use crate::schema::{
    AgentConfig, CustomWorkflowConfig, LinearWorkflowConfig, LlmConfig, ToolServerConfig,
};
pub use crate::validate::FieldError;

type RecordKey = (ComponentKind, String);

struct IndexSnapshot {
    generation: u64,
    records: HashMap<RecordKey, Arc<ComponentRecord>>,
    env: HashMap<String, String>,
}

impl IndexSnapshot {
    fn empty() -> Self {
        Self {
            generation: 0,
            records: HashMap::new(),
            env: HashMap::new(),
        }
    }
}

/// Hierarchical, first-match configuration index (C1).
pub struct ConfigIndex {
    working_dir: PathBuf,
    user_global_dir: Option<PathBuf>,
    /// `FORCE_CONFIG_REFRESH`: rebuild the snapshot on every `get` when
    /// true (development), or serve the cached snapshot (production).
    refresh_on_read: bool,
    snapshot: RwLock<Arc<IndexSnapshot>>,
    /// Programmatic records always win over file-based ones of equal
    /// `(kind, id)` and never participate in the refresh rebuild.
    programmatic: RwLock<HashMap<RecordKey, Arc<ComponentRecord>>>,
}

const COMPONENT_EXTENSIONS: &[&str] = &["json", "yaml", "yml", "toml"];

impl ConfigIndex {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        let working_dir = working_dir.into();
        let refresh_on_read = std::env::var("FORCE_CONFIG_REFRESH")
            .map(|value| value != "0" && !value.eq_ignore_ascii_case("false"))
            .unwrap_or(true);
        let index = Self {
            working_dir,
            user_global_dir: discovery::default_user_global_dir(),
            refresh_on_read,
            snapshot: RwLock::new(Arc::new(IndexSnapshot::empty())),
            programmatic: RwLock::new(HashMap::new()),
        };
        index.refresh();
        index
    }

    #[cfg(test)]
    pub fn new_with_global_dir(working_dir: impl Into<PathBuf>, global_dir: Option<PathBuf>) -> Self {
        let index = Self {
            working_dir: working_dir.into(),
            user_global_dir: global_dir,
            refresh_on_read: true,
            snapshot: RwLock::new(Arc::new(IndexSnapshot::empty())),
            programmatic: RwLock::new(HashMap::new()),
        };
        index.refresh();
        index
    }

    /// Rebuild the snapshot and atomically publish it. Readers mid-flight
    /// keep observing the old `Arc` until they next deref.
    pub fn refresh(&self) {
        let discovered = discovery::discover(&self.working_dir, self.user_global_dir.clone());
        let mut records: HashMap<RecordKey, Arc<ComponentRecord>> = HashMap::new();

        for source in &discovered.sources {
            index_source_root(source, &mut records);
        }

        let generation = {
            let current = self.snapshot.read().expect("snapshot lock poisoned");
            current.generation + 1
        };

        let mut guard = self.snapshot.write().expect("snapshot lock poisoned");
        *guard = Arc::new(IndexSnapshot {
            generation,
            records,
            env: discovered.env,
        });
    }

    fn current_snapshot(&self) -> Arc<IndexSnapshot> {
        if self.refresh_on_read {
            self.refresh();
        }
        self.snapshot.read().expect("snapshot lock poisoned").clone()
    }

    pub fn generation(&self) -> u64 {
        self.current_snapshot().generation
    }

    /// Merged `env` section across every anchor, closest-wins.
    pub fn env(&self) -> HashMap<String, String> {
        self.current_snapshot().env.clone()
    }

    fn lookup(&self, kind: ComponentKind, id: &str) -> Option<Arc<ComponentRecord>> {
        let key = (kind, id.to_string());
        if let Some(record) = self.programmatic.read().expect("lock poisoned").get(&key) {
            return Some(record.clone());
        }
        self.current_snapshot().records.get(&key).cloned()
    }

    pub fn get(&self, kind: ComponentKind, id: &str) -> Result<Arc<ComponentRecord>, AuriteError> {
        self.lookup(kind, id).ok_or_else(|| AuriteError::ConfigNotFound {
            kind: kind.as_str().to_string(),
            id: id.to_string(),
        })
    }

    pub fn list(&self, kind: ComponentKind) -> Vec<Arc<ComponentRecord>> {
        let programmatic = self.programmatic.read().expect("lock poisoned");
        let snapshot = self.current_snapshot();
        let mut seen: HashMap<String, Arc<ComponentRecord>> = HashMap::new();
        for record in snapshot.records.values().filter(|r| r.kind == kind) {
            seen.insert(record.id.clone(), record.clone());
        }
        for record in programmatic.values().filter(|r| r.kind == kind) {
            seen.insert(record.id.clone(), record.clone());
        }
        let mut out: Vec<_> = seen.into_values().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Register a record that lives only in memory; always wins over
    /// file-based records of the same `(kind, id)`. Fails with
    /// `ConfigConflict` if a programmatic record with the same key is
    /// already registered.
    pub fn register_programmatic(
        &self,
        kind: ComponentKind,
        id: impl Into<String>,
        body: serde_json::Value,
    ) -> Result<(), AuriteError> {
        let id = id.into();
        let key = (kind, id.clone());
        let mut programmatic = self.programmatic.write().expect("lock poisoned");
        if programmatic.contains_key(&key) {
            return Err(AuriteError::ConfigConflict {
                kind: kind.as_str().to_string(),
                id,
            });
        }
        programmatic.insert(
            key,
            Arc::new(ComponentRecord {
                kind,
                id,
                body,
                source_file: None,
                context_path: self.working_dir.clone(),
                context_level: ContextLevel::Programmatic,
            }),
        );
        Ok(())
    }

    pub fn validate(&self, kind: ComponentKind, id: &str) -> (bool, Vec<FieldError>) {
        match self.lookup(kind, id) {
            Some(record) => {
                let errors = crate::validate::validate_record(&record);
                (errors.is_empty(), errors)
            }
            None => (
                false,
                vec![FieldError {
                    field: "<record>".to_string(),
                    message: format!("no {}/{} in the index", kind.as_str(), id),
                }],
            ),
        }
    }

    pub fn validate_all(&self) -> Vec<(ComponentKind, String, Vec<FieldError>)> {
        let kinds = [
            ComponentKind::Agent,
            ComponentKind::Llm,
            ComponentKind::McpServer,
            ComponentKind::LinearWorkflow,
            ComponentKind::CustomWorkflow,
        ];
        let mut out = Vec::new();
        for kind in kinds {
            for record in self.list(kind) {
                let errors = crate::validate::validate_record(&record);
                if !errors.is_empty() {
                    out.push((kind, record.id.clone(), errors));
                }
            }
        }
        out
    }

    pub fn get_agent(&self, id: &str) -> Result<AgentConfig, AuriteError> {
        let record = self.get(ComponentKind::Agent, id)?;
        deserialize(&record)
    }

    pub fn get_llm(&self, id: &str) -> Result<LlmConfig, AuriteError> {
        let record = self.get(ComponentKind::Llm, id)?;
        deserialize(&record)
    }

    pub fn get_tool_server(&self, id: &str) -> Result<ToolServerConfig, AuriteError> {
        let record = self.get(ComponentKind::McpServer, id)?;
        let mut config: ToolServerConfig = deserialize(&record)?;
        config.resolve_paths(&record.context_path);
        Ok(config)
    }

    pub fn get_linear_workflow(&self, id: &str) -> Result<LinearWorkflowConfig, AuriteError> {
        let record = self.get(ComponentKind::LinearWorkflow, id)?;
        deserialize(&record)
    }

    pub fn get_custom_workflow(&self, id: &str) -> Result<CustomWorkflowConfig, AuriteError> {
        let record = self.get(ComponentKind::CustomWorkflow, id)?;
        let mut config: CustomWorkflowConfig = deserialize(&record)?;
        config.resolve_paths(&record.context_path);
        Ok(config)
    }
}

fn deserialize<T: serde::de::DeserializeOwned>(record: &ComponentRecord) -> Result<T, AuriteError> {
    serde_json::from_value(record.body.clone()).map_err(|error| AuriteError::ConfigInvalid {
        kind: record.kind.as_str().to_string(),
        id: record.id.clone(),
        errors: vec![error.to_string()],
    })
}

fn index_source_root(source: &SourceRoot, records: &mut HashMap<RecordKey, Arc<ComponentRecord>>) {
    if !source.dir.is_dir() {
        return;
    }
    for path in walk_component_files(&source.dir) {
        match load_component_documents(&path) {
            Ok(documents) => {
                for (kind, id, body) in documents {
                    let key = (kind, id.clone());
                    if records.contains_key(&key) {
                        tracing::warn!(
                            kind = kind.as_str(),
                            id,
                            path = %path.display(),
                            "duplicate component id, keeping first-wins record"
                        );
                        continue;
                    }
                    records.insert(
                        key,
                        Arc::new(ComponentRecord {
                            kind,
                            id,
                            body,
                            source_file: Some(path.clone()),
                            context_path: source.dir.clone(),
                            context_level: source.level,
                        }),
                    );
                }
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "failed to parse component document");
            }
        }
    }
}

fn walk_component_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| COMPONENT_EXTENSIONS.contains(&ext))
            {
                out.push(path);
            }
        }
    }
    out
}

/// Parses a component document: either a single object or an ordered
/// sequence of objects (spec §6 "Component files").
fn load_component_documents(path: &Path) -> Result<Vec<(ComponentKind, String, serde_json::Value)>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = parse_by_extension(path, &content)?;

    let items: Vec<serde_json::Value> = match value {
        serde_json::Value::Array(items) => items,
        other => vec![other],
    };

    let mut out = Vec::new();
    for item in items {
        let kind = item
            .get("type")
            .and_then(|v| v.as_str())
            .and_then(ComponentKind::from_str)
            .with_context(|| format!("{}: component missing a recognized 'type'", path.display()))?;
        let id = item
            .get("name")
            .and_then(|v| v.as_str())
            .with_context(|| format!("{}: component missing 'name'", path.display()))?
            .to_string();
        out.push((kind, id, item));
    }
    Ok(out)
}

fn parse_by_extension(path: &Path, content: &str) -> Result<serde_json::Value> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => {
            let value: toml::Value = toml::from_str(content)
                .with_context(|| format!("failed to parse TOML {}", path.display()))?;
            Ok(serde_json::to_value(value)?)
        }
        Some("yaml") | Some("yml") => {
            let value: serde_yaml::Value = serde_yaml::from_str(content)
                .with_context(|| format!("failed to parse YAML {}", path.display()))?;
            Ok(serde_json::to_value(value)?)
        }
        _ => serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON {}", path.display())),
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
