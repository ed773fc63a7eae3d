//! Session-id generation (spec §4.6, §6, invariant 6).
//!
//! `"agent-" + 8 hex chars` is 14 characters total; `"workflow-" + id`
//! where `id` is either a caller-supplied name or a generated 8 hex
//! suffix. Ids are prefix-stable: a caller-provided id lacking the
//! required prefix is rewritten to include it (invariant 6) by the
//! session layer, not here — this module only generates fresh ids.

use rand::Rng;

const HEX_CHARS: &[u8] = b"0123456789abcdef";

fn random_hex(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| HEX_CHARS[rng.gen_range(0..HEX_CHARS.len())] as char)
        .collect()
}

/// Generates `"agent-" + 8 hex chars"` (14 characters total, per spec
/// scenario S1).
pub fn new_agent_session_id() -> String {
    format!("agent-{}", random_hex(8))
}

/// Generates `"workflow-" + 8 hex chars"`.
pub fn new_workflow_session_id() -> String {
    format!("workflow-{}", random_hex(8))
}

/// Rewrites a caller-provided id to carry the required prefix if it is
/// missing one (invariant 6). A caller-provided id that already starts
/// with the prefix is returned unchanged.
pub fn ensure_prefixed(id: &str, prefix: &str) -> String {
    if id.starts_with(prefix) {
        id.to_string()
    } else {
        format!("{prefix}{id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_session_id_is_fourteen_chars() {
        let id = new_agent_session_id();
        assert_eq!(id.len(), 14);
        assert!(id.starts_with("agent-"));
    }

    #[test]
    fn ensure_prefixed_adds_missing_prefix() {
        assert_eq!(ensure_prefixed("abc", "workflow-"), "workflow-abc");
    }

    #[test]
    fn ensure_prefixed_leaves_already_prefixed_id_alone() {
        assert_eq!(
            ensure_prefixed("workflow-abc", "workflow-"),
            "workflow-abc"
        );
    }
}
