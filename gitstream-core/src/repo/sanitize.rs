//! Repository identifier sanitization
//!
//! Identifiers arrive from untrusted external input on every request and are
//! used as directory names under the repository root. Sanitization is purely
//! lexical: no filesystem access, no side effects.

/// Normalize and validate a user-supplied repository identifier.
///
/// Resolves `.` and `..` segments lexically, then rejects identifiers that
/// would escape the repository root: empty results, bare `.`/`..`, anything
/// still beginning with a parent escape, and absolute paths (`Path::join`
/// would replace the root entirely for those).
///
/// Returns the normalized relative identifier, or `None` when invalid.
pub fn sanitize_repository_id(raw: &str) -> Option<String> {
    if raw.starts_with('/') || raw.starts_with('\\') || raw.contains('\0') {
        return None;
    }

    let mut parts: Vec<&str> = Vec::new();
    for segment in raw.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), None | Some(&"..")) {
                    parts.push("..");
                } else {
                    parts.pop();
                }
            }
            other => parts.push(other),
        }
    }

    if parts.is_empty() || parts[0] == ".." {
        return None;
    }

    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_name_accepted() {
        assert_eq!(sanitize_repository_id("demo"), Some("demo".to_string()));
        assert_eq!(
            sanitize_repository_id("my-repo.git"),
            Some("my-repo.git".to_string())
        );
    }

    #[test]
    fn test_inner_dotdot_resolved() {
        assert_eq!(
            sanitize_repository_id("a/../b"),
            Some("b".to_string())
        );
        assert_eq!(
            sanitize_repository_id("demo/./sub"),
            Some("demo/sub".to_string())
        );
    }

    #[test]
    fn test_traversal_rejected() {
        assert_eq!(sanitize_repository_id("../../etc"), None);
        assert_eq!(sanitize_repository_id("../x"), None);
        assert_eq!(sanitize_repository_id("a/../../y"), None);
        assert_eq!(sanitize_repository_id(".."), None);
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(sanitize_repository_id(""), None);
        assert_eq!(sanitize_repository_id("."), None);
        assert_eq!(sanitize_repository_id("a/.."), None);
        assert_eq!(sanitize_repository_id("./"), None);
    }

    #[test]
    fn test_absolute_rejected() {
        assert_eq!(sanitize_repository_id("/etc"), None);
        assert_eq!(sanitize_repository_id("\\share"), None);
    }

    #[test]
    fn test_trailing_separator_tolerated() {
        assert_eq!(sanitize_repository_id("demo/"), Some("demo".to_string()));
    }

    #[test]
    fn test_nul_rejected() {
        assert_eq!(sanitize_repository_id("de\0mo"), None);
    }
}
