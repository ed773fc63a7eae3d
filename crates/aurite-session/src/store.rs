//! Keyed, write-through session persistence (spec §4.2, C2).
//!
//! One file per session in a cache directory; writes go through a
//! write-temp-and-rename so a reader never observes a partial file
//! (spec §5 "the on-disk write is atomic"). Access to a given
//! `session_id` is serialized by a per-id lock so concurrent saves
//! (e.g. streaming append + a competing save) cannot interleave;
//! different ids proceed concurrently.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Utc;

use aurite_core::{AuriteError, ExecutionResult, Message, WorkflowResult};

use crate::model::{Session, SessionKind};
use crate::sanitize::sanitize_session_id;

const MAX_PARTIAL_MATCHES_REPORTED: usize = 5;

#[derive(Debug, Default, Clone)]
pub struct SessionFilter {
    pub agent_name: Option<String>,
    pub workflow_name: Option<String>,
}

pub struct SessionStore {
    cache_dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// `~/.aurite/sessions` by the crate's own default, mirroring the
    /// config layer's fixed user-global directory.
    pub fn default_cache_dir() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(".aurite").join("sessions"))
    }

    fn path_for(&self, session_id: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.json", sanitize_session_id(session_id)))
    }

    fn lock_for(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("lock table poisoned");
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn write_atomic(&self, session: &Session) -> Result<()> {
        std::fs::create_dir_all(&self.cache_dir)
            .with_context(|| format!("creating {}", self.cache_dir.display()))?;
        let path = self.path_for(&session.id);
        let contents = serde_json::to_string_pretty(session).context("serializing session")?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)
            .with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))?;
        Ok(())
    }

    fn read_exact(&self, session_id: &str) -> Option<Session> {
        let path = self.path_for(session_id);
        let contents = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<Session>(&contents) {
            Ok(mut session) => {
                if session.message_count.is_none() {
                    session.recompute_message_count();
                }
                Some(session)
            }
            Err(error) => {
                tracing::warn!(session_id, %error, "failed to parse session file, skipping");
                None
            }
        }
    }

    fn list_all(&self) -> Vec<Session> {
        let Ok(entries) = std::fs::read_dir(&self.cache_dir) else {
            return Vec::new();
        };
        let mut sessions = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(contents) = std::fs::read_to_string(&path) else {
                continue;
            };
            match serde_json::from_str::<Session>(&contents) {
                Ok(mut session) => {
                    if session.message_count.is_none() {
                        session.recompute_message_count();
                    }
                    sessions.push(session);
                }
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "skipping unreadable session file");
                }
            }
        }
        sessions
    }

    /// Save (create or update) an agent run's session record.
    pub fn save_agent(
        &self,
        session_id: &str,
        base_id: &str,
        agent_name: &str,
        result: &ExecutionResult,
    ) -> Result<Session> {
        let guard = self.lock_for(session_id);
        let _held = guard.lock().expect("session lock poisoned");

        let now = Utc::now();
        let mut session = self.read_exact(session_id).unwrap_or_else(|| Session {
            id: session_id.to_string(),
            base_id: base_id.to_string(),
            kind: SessionKind::Agent,
            name: agent_name.to_string(),
            created_at: now,
            last_updated: now,
            message_count: Some(0),
            agents_involved: HashMap::new(),
            messages: Vec::new(),
            result: serde_json::Value::Null,
        });

        session.name = agent_name.to_string();
        session.last_updated = now;
        session.messages = result.conversation.clone();
        session.result = serde_json::to_value(result).context("serializing execution result")?;
        session.recompute_message_count();
        session
            .agents_involved
            .insert(session_id.to_string(), agent_name.to_string());

        self.write_atomic(&session)?;
        Ok(session)
    }

    /// Save (create or update) a workflow run's session record.
    pub fn save_workflow(
        &self,
        session_id: &str,
        base_id: &str,
        workflow_name: &str,
        result: &WorkflowResult,
    ) -> Result<Session> {
        let guard = self.lock_for(session_id);
        let _held = guard.lock().expect("session lock poisoned");

        let now = Utc::now();
        let mut session = self.read_exact(session_id).unwrap_or_else(|| Session {
            id: session_id.to_string(),
            base_id: base_id.to_string(),
            kind: SessionKind::Workflow,
            name: workflow_name.to_string(),
            created_at: now,
            last_updated: now,
            message_count: Some(0),
            agents_involved: HashMap::new(),
            messages: Vec::new(),
            result: serde_json::Value::Null,
        });

        session.name = workflow_name.to_string();
        session.last_updated = now;
        session.result = serde_json::to_value(result).context("serializing workflow result")?;
        for step in &result.steps {
            session
                .agents_involved
                .insert(step.session_id.clone(), step.component_id.clone());
        }
        session.recompute_message_count();

        self.write_atomic(&session)?;
        Ok(session)
    }

    /// Atomic read-modify-write append used during streaming so history
    /// survives even if the caller never reaches a final save.
    pub fn append_message(&self, session_id: &str, agent_name: &str, message: Message) -> Result<()> {
        let guard = self.lock_for(session_id);
        let _held = guard.lock().expect("session lock poisoned");

        let now = Utc::now();
        let mut session = self.read_exact(session_id).unwrap_or_else(|| Session {
            id: session_id.to_string(),
            base_id: session_id.to_string(),
            kind: SessionKind::Agent,
            name: agent_name.to_string(),
            created_at: now,
            last_updated: now,
            message_count: Some(0),
            agents_involved: HashMap::new(),
            messages: Vec::new(),
            result: serde_json::Value::Null,
        });

        session.messages.push(message);
        session.last_updated = now;
        session.recompute_message_count();
        self.write_atomic(&session)
    }

    /// Exact lookup by id; on a miss, search every session whose
    /// `base_id == session_id` (spec §4.2 `get`).
    pub fn get(&self, session_id: &str) -> Result<Session, AuriteError> {
        if let Some(session) = self.read_exact(session_id) {
            return Ok(session);
        }

        let candidates: Vec<Session> = self
            .list_all()
            .into_iter()
            .filter(|session| session.base_id == session_id)
            .collect();

        match candidates.len() {
            0 => Err(AuriteError::SessionNotFound(session_id.to_string())),
            1 => Ok(candidates.into_iter().next().unwrap()),
            _ => {
                let mut ids: Vec<String> = candidates.into_iter().map(|s| s.id).collect();
                ids.sort();
                ids.truncate(MAX_PARTIAL_MATCHES_REPORTED);
                Err(AuriteError::AmbiguousPartialId {
                    prefix: session_id.to_string(),
                    candidates: ids,
                })
            }
        }
    }

    /// Sorted by `last_updated` descending; returns `(total, page)`.
    pub fn list(&self, filter: &SessionFilter, offset: usize, limit: usize) -> (usize, Vec<Session>) {
        let mut sessions = self.list_all();
        sessions.retain(|session| {
            let agent_ok = filter
                .agent_name
                .as_ref()
                .is_none_or(|name| session.kind == SessionKind::Agent && &session.name == name);
            let workflow_ok = filter
                .workflow_name
                .as_ref()
                .is_none_or(|name| session.kind == SessionKind::Workflow && &session.name == name);
            agent_ok && workflow_ok
        });
        sessions.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        let total = sessions.len();
        let page = sessions.into_iter().skip(offset).take(limit).collect();
        (total, page)
    }

    /// Deletes `session_id`. If it is a workflow, cascades to every
    /// agent session sharing its `base_id`; if it is a child agent,
    /// patches parent workflow records to drop it from
    /// `agents_involved` before physically deleting it.
    pub fn delete(&self, session_id: &str) -> Result<(), AuriteError> {
        let target = self.get(session_id)?;
        let target_id = target.id.clone();

        if target.kind == SessionKind::Workflow {
            let children: Vec<String> = self
                .list_all()
                .into_iter()
                .filter(|session| {
                    session.kind == SessionKind::Agent
                        && session.base_id == target.base_id
                        && session.id != target_id
                })
                .map(|session| session.id)
                .collect();
            for child_id in children {
                self.delete_file(&child_id);
            }
        } else {
            self.remove_from_parent_workflows(&target_id);
        }

        self.delete_file(&target_id);
        Ok(())
    }

    fn remove_from_parent_workflows(&self, child_id: &str) {
        for mut session in self.list_all() {
            if session.kind != SessionKind::Workflow {
                continue;
            }
            if session.agents_involved.remove(child_id).is_some() {
                session.last_updated = Utc::now();
                if let Err(error) = self.write_atomic(&session) {
                    tracing::warn!(session_id = %session.id, %error, "failed to patch parent workflow on delete");
                }
            }
        }
    }

    fn delete_file(&self, session_id: &str) {
        let path = self.path_for(session_id);
        if let Err(error) = std::fs::remove_file(&path) {
            if error.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(session_id, %error, "failed to remove session file");
            }
        }
    }

    /// Deletion set is the union of age-expired sessions and the oldest
    /// sessions beyond `max_sessions`; applied with `delete`'s cascade
    /// semantics. Returns the ids actually removed.
    pub fn cleanup(&self, max_age_days: Option<i64>, max_sessions: Option<usize>) -> Result<Vec<String>> {
        let mut sessions = self.list_all();
        sessions.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));

        let mut doomed: std::collections::HashSet<String> = std::collections::HashSet::new();

        if let Some(max_age_days) = max_age_days {
            let cutoff = Utc::now() - chrono::Duration::days(max_age_days);
            for session in &sessions {
                if session.last_updated < cutoff {
                    doomed.insert(session.id.clone());
                }
            }
        }

        if let Some(max_sessions) = max_sessions {
            for session in sessions.iter().skip(max_sessions) {
                doomed.insert(session.id.clone());
            }
        }

        let mut deleted = Vec::new();
        for id in &doomed {
            // A cascade delete (workflow -> children) may have already
            // removed this id; a missing record is not an error here.
            match self.delete(id) {
                Ok(()) => deleted.push(id.clone()),
                Err(AuriteError::SessionNotFound(_)) => {}
                Err(other) => return Err(other.into()),
            }
        }
        Ok(deleted)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
