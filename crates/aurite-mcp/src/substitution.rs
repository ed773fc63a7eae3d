//! `{NAME}` placeholder resolution for tool-server configs (spec §6:
//! "placeholders inside `headers`, `args`, and `http_endpoint` are
//! resolved at registration").

use std::collections::HashMap;

/// Resolves every `{NAME}` occurrence in `template` against `env`
/// first, falling back to the process environment. A placeholder that
/// resolves to nothing is left in place and logged, since failing the
/// whole registration over one unrelated optional header would be too
/// strict.
pub fn substitute(template: &str, env: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = template[i + 1..].find('}') {
                let name = &template[i + 1..i + 1 + end];
                if is_placeholder_name(name) {
                    match resolve(name, env) {
                        Some(value) => {
                            out.push_str(&value);
                            i += end + 2;
                            continue;
                        }
                        None => {
                            tracing::warn!(placeholder = name, "unresolved environment placeholder");
                        }
                    }
                }
            }
        }
        let ch = template[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

pub fn substitute_map(map: &HashMap<String, String>, env: &HashMap<String, String>) -> HashMap<String, String> {
    map.iter()
        .map(|(k, v)| (k.clone(), substitute(v, env)))
        .collect()
}

fn is_placeholder_name(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn resolve(name: &str, env: &HashMap<String, String>) -> Option<String> {
    env.get(name)
        .cloned()
        .or_else(|| std::env::var(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_from_config_env_map() {
        let mut env = HashMap::new();
        env.insert("API_KEY".to_string(), "secret123".to_string());
        assert_eq!(substitute("Bearer {API_KEY}", &env), "Bearer secret123");
    }

    #[test]
    fn leaves_unresolvable_placeholder_untouched() {
        let env = HashMap::new();
        assert_eq!(substitute("{NOT_SET_XYZ}", &env), "{NOT_SET_XYZ}");
    }

    #[test]
    fn ignores_braces_that_are_not_placeholders() {
        let env = HashMap::new();
        assert_eq!(substitute("{}", &env), "{}");
        assert_eq!(substitute("a { b } c", &env), "a { b } c");
    }
}
