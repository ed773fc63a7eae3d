//! Session id sanitization for on-disk filenames (spec §4.2: "filenames
//! must be sanitized to prevent path traversal").

/// Strips everything but ASCII alphanumerics, `-`, and `_`.
pub fn sanitize_session_id(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_path_traversal_sequences() {
        assert_eq!(sanitize_session_id("../../etc/passwd"), "etcpasswd");
    }

    #[test]
    fn keeps_hyphen_and_underscore() {
        assert_eq!(sanitize_session_id("agent-ab12cd34"), "agent-ab12cd34");
        assert_eq!(sanitize_session_id("workflow_ab12"), "workflow_ab12");
    }

    #[test]
    fn drops_whitespace_and_slashes() {
        assert_eq!(sanitize_session_id("agent 1/2"), "agent12");
    }
}
