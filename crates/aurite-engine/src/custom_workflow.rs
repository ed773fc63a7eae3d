//! Custom workflow entry points (spec §4.6 "Custom workflow").
//!
//! Rust has no safe equivalent of loading an arbitrary module path at
//! runtime the way a dynamic language can, so a `CustomWorkflowConfig`'s
//! `module_path`/`class_name` serve only as the configuration record's
//! identity; the actual entry point is a `CustomWorkflow` trait object
//! the host application registers by the workflow's `name` before
//! invoking it, the same way `csa-scheduler` registers concrete task
//! handlers by id rather than resolving them from a string at runtime.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::engine::EngineFacade;

#[async_trait]
pub trait CustomWorkflow: Send + Sync {
    async fn run(
        &self,
        initial_input: serde_json::Value,
        facade: EngineFacade,
        session_id: String,
    ) -> Result<serde_json::Value, anyhow::Error>;
}

#[derive(Default)]
pub struct CustomWorkflowRegistry {
    entries: RwLock<HashMap<String, Arc<dyn CustomWorkflow>>>,
}

impl CustomWorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, workflow_id: impl Into<String>, workflow: Arc<dyn CustomWorkflow>) {
        self.entries
            .write()
            .expect("custom workflow registry lock poisoned")
            .insert(workflow_id.into(), workflow);
    }

    pub fn get(&self, workflow_id: &str) -> Option<Arc<dyn CustomWorkflow>> {
        self.entries
            .read()
            .expect("custom workflow registry lock poisoned")
            .get(workflow_id)
            .cloned()
    }
}
