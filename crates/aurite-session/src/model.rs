//! The persisted session record (spec §4.2, `Session`).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aurite_core::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Agent,
    Workflow,
}

/// One persisted execution record. `created_at` never changes after the
/// first write; `last_updated` only moves forward; `base_id == id` for a
/// root session (an agent run on its own, or the top of a workflow).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub base_id: String,
    pub kind: SessionKind,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub message_count: Option<u32>,
    #[serde(default)]
    pub agents_involved: HashMap<String, String>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub result: serde_json::Value,
}

impl Session {
    /// Recompute `message_count` from the stored conversation. Called on
    /// every save and on first read of a legacy record that predates the
    /// field (spec §4.2 "legacy records ... repaired on first read").
    pub fn recompute_message_count(&mut self) {
        self.message_count = Some(self.messages.len() as u32);
    }
}
