//! Anchor discovery and the priority-ordered source list (spec §4.1
//! "Anchor discovery" / "Priority order"). Built once per snapshot;
//! `get` never re-walks the filesystem (spec §9 "Anchor walk & priority").

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::anchor::{ANCHOR_FILE_NAME, AnchorFile, AnchorKind};
use crate::record::ContextLevel;

/// One directory to scan for component files, tagged with the
/// provenance level its records should carry.
#[derive(Debug, Clone)]
pub struct SourceRoot {
    pub dir: PathBuf,
    pub level: ContextLevel,
}

pub struct DiscoveryResult {
    pub sources: Vec<SourceRoot>,
    pub env: HashMap<String, String>,
}

/// Walk up from `start_dir`, collecting every `.aurite` file, closest
/// first.
fn walk_up_anchors(start_dir: &Path) -> Vec<AnchorFile> {
    let mut anchors = Vec::new();
    let mut dir = Some(start_dir.to_path_buf());
    while let Some(current) = dir {
        let candidate = current.join(ANCHOR_FILE_NAME);
        if candidate.is_file() {
            match AnchorFile::load(&candidate) {
                Ok(anchor) => anchors.push(anchor),
                Err(error) => {
                    tracing::warn!(path = %candidate.display(), %error, "failed to parse anchor file");
                }
            }
        }
        dir = current.parent().map(Path::to_path_buf);
    }
    anchors
}

fn level_for(kind: AnchorKind) -> ContextLevel {
    match kind {
        AnchorKind::Project => ContextLevel::Project,
        AnchorKind::Workspace => ContextLevel::Workspace,
    }
}

/// Builds the full priority-ordered source list for a working
/// directory: closest anchor's own roots, then its `include_configs`,
/// then each outer anchor's roots/include_configs (plus a workspace
/// anchor's `projects`), then the user-global directory. Programmatic
/// records (priority 1) are not part of this list — they live in the
/// index's in-memory overlay.
pub fn discover(working_dir: &Path, user_global_dir: Option<PathBuf>) -> DiscoveryResult {
    let anchors = walk_up_anchors(working_dir);
    let mut sources = Vec::new();
    let mut env = HashMap::new();

    for anchor in &anchors {
        let level = level_for(anchor.kind);
        for root in anchor.own_roots() {
            sources.push(SourceRoot { dir: root, level });
        }
        for include in &anchor.include_configs {
            sources.push(SourceRoot {
                dir: include.clone(),
                level,
            });
        }
        if anchor.kind == AnchorKind::Workspace {
            for project in &anchor.projects {
                sources.push(SourceRoot {
                    dir: project.clone(),
                    level: ContextLevel::Project,
                });
            }
        }
        // Closest anchor wins for any given env key; anchors are
        // visited closest-first, so the first insertion per key stands.
        for (key, value) in &anchor.env {
            env.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    if let Some(global_dir) = user_global_dir {
        sources.push(SourceRoot {
            dir: global_dir,
            level: ContextLevel::User,
        });
    }

    DiscoveryResult { sources, env }
}

/// Fixed path under the user's home directory (spec §4.1 step 5).
pub fn default_user_global_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(".aurite"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn closest_anchor_sorts_before_outer_anchor() {
        let root = tempdir().unwrap();
        std::fs::write(
            root.path().join(ANCHOR_FILE_NAME),
            "[aurite]\ntype = \"workspace\"\n",
        )
        .unwrap();
        let nested = root.path().join("project");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(
            nested.join(ANCHOR_FILE_NAME),
            "[aurite]\ntype = \"project\"\n",
        )
        .unwrap();

        let result = discover(&nested, None);
        assert_eq!(result.sources[0].dir, nested);
        assert_eq!(result.sources[0].level, ContextLevel::Project);
        assert_eq!(result.sources[1].dir, root.path());
        assert_eq!(result.sources[1].level, ContextLevel::Workspace);
    }

    #[test]
    fn closest_anchor_env_wins() {
        let root = tempdir().unwrap();
        std::fs::write(
            root.path().join(ANCHOR_FILE_NAME),
            "[aurite]\ntype = \"workspace\"\n\n[env]\nFOO = \"outer\"\nBAR = \"outer-only\"\n",
        )
        .unwrap();
        let nested = root.path().join("project");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(
            nested.join(ANCHOR_FILE_NAME),
            "[aurite]\ntype = \"project\"\n\n[env]\nFOO = \"inner\"\n",
        )
        .unwrap();

        let result = discover(&nested, None);
        assert_eq!(result.env.get("FOO"), Some(&"inner".to_string()));
        assert_eq!(result.env.get("BAR"), Some(&"outer-only".to_string()));
    }

    #[test]
    fn user_global_dir_is_appended_last() {
        let root = tempdir().unwrap();
        let global = PathBuf::from("/tmp/fixture-aurite-global");
        let result = discover(root.path(), Some(global.clone()));
        assert_eq!(result.sources.last().unwrap().dir, global);
        assert_eq!(result.sources.last().unwrap().level, ContextLevel::User);
    }
}
