//! `.aurite` anchor file format (spec §6 "Anchor file format").

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const ANCHOR_FILE_NAME: &str = ".aurite";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorKind {
    Project,
    Workspace,
}

#[derive(Debug, Clone, Deserialize)]
struct AnchorSection {
    #[serde(rename = "type")]
    kind: AnchorKind,
    #[serde(default)]
    include_configs: Vec<String>,
    #[serde(default)]
    projects: Vec<String>,
    #[serde(default)]
    custom_workflow_paths: Vec<String>,
    #[serde(default)]
    tool_server_paths: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AnchorFileRaw {
    aurite: AnchorSection,
    #[serde(default)]
    env: HashMap<String, String>,
}

/// A parsed `.aurite` anchor file, plus the directory it was found in
/// (its `context_path` for path-relative resolution).
#[derive(Debug, Clone)]
pub struct AnchorFile {
    pub dir: PathBuf,
    pub kind: AnchorKind,
    pub include_configs: Vec<PathBuf>,
    pub projects: Vec<PathBuf>,
    pub custom_workflow_paths: Vec<PathBuf>,
    pub tool_server_paths: Vec<PathBuf>,
    pub env: HashMap<String, String>,
}

impl AnchorFile {
    pub fn load(path: &Path) -> Result<Self> {
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read anchor file {}", path.display()))?;
        let raw: AnchorFileRaw = toml::from_str(&content)
            .with_context(|| format!("failed to parse anchor file {}", path.display()))?;

        let resolve = |rel: &str| dir.join(rel);
        Ok(Self {
            include_configs: raw.aurite.include_configs.iter().map(|r| resolve(r)).collect(),
            projects: raw.aurite.projects.iter().map(|r| resolve(r)).collect(),
            custom_workflow_paths: raw
                .aurite
                .custom_workflow_paths
                .iter()
                .map(|r| resolve(r))
                .collect(),
            tool_server_paths: raw
                .aurite
                .tool_server_paths
                .iter()
                .map(|r| resolve(r))
                .collect(),
            kind: raw.aurite.kind,
            env: raw.env,
            dir,
        })
    }

    /// The anchor's own config roots, in declared order. An anchor
    /// always implicitly scans its own directory; `tool_server_paths`
    /// and `custom_workflow_paths` extend it with any additional
    /// component directories the anchor names explicitly.
    pub fn own_roots(&self) -> Vec<PathBuf> {
        let mut roots = vec![self.dir.clone()];
        roots.extend(self.tool_server_paths.iter().cloned());
        roots.extend(self.custom_workflow_paths.iter().cloned());
        roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loads_project_anchor_with_defaults() {
        let dir = tempdir().unwrap();
        let anchor_path = dir.path().join(ANCHOR_FILE_NAME);
        std::fs::write(&anchor_path, "[aurite]\ntype = \"project\"\n").unwrap();

        let anchor = AnchorFile::load(&anchor_path).unwrap();
        assert_eq!(anchor.kind, AnchorKind::Project);
        assert!(anchor.include_configs.is_empty());
        assert_eq!(anchor.own_roots(), vec![dir.path().to_path_buf()]);
    }

    #[test]
    fn resolves_include_configs_relative_to_anchor_dir() {
        let dir = tempdir().unwrap();
        let anchor_path = dir.path().join(ANCHOR_FILE_NAME);
        std::fs::write(
            &anchor_path,
            "[aurite]\ntype = \"workspace\"\ninclude_configs = [\"shared\"]\nprojects = [\"../other\"]\n",
        )
        .unwrap();

        let anchor = AnchorFile::load(&anchor_path).unwrap();
        assert_eq!(anchor.include_configs, vec![dir.path().join("shared")]);
        assert_eq!(anchor.projects, vec![dir.path().join("../other")]);
    }

    #[test]
    fn parses_env_section() {
        let dir = tempdir().unwrap();
        let anchor_path = dir.path().join(ANCHOR_FILE_NAME);
        std::fs::write(
            &anchor_path,
            "[aurite]\ntype = \"project\"\n\n[env]\nAPI_KEY = \"abc\"\n",
        )
        .unwrap();

        let anchor = AnchorFile::load(&anchor_path).unwrap();
        assert_eq!(anchor.env.get("API_KEY"), Some(&"abc".to_string()));
    }
}
