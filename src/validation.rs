//! Input validation and sanitization applied before requests are sent.
//!
//! Azure DevOps rejects many of these inputs itself, but with error messages
//! that are hard for a caller (or an agent) to act on. Checking up front keeps
//! bad input from ever reaching the wire and produces a [`ValidationError`]
//! naming the offending field.

use crate::error::ValidationError;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Characters Azure DevOps forbids in project, team, feed and repository names.
const FORBIDDEN_NAME_CHARS: &[char] = &[
    '\\', '/', ':', '*', '?', '"', '<', '>', '|', ';', '#', '$', '%', '&', '+', ',',
];

static GIT_REF_FORBIDDEN: OnceLock<Regex> = OnceLock::new();

fn git_ref_forbidden_regex() -> &'static Regex {
    GIT_REF_FORBIDDEN.get_or_init(|| {
        Regex::new(r"(\.\.|@\{|//|[\s~^:?*\[\\\x00-\x1f\x7f])")
            .expect("Failed to compile git ref regex")
    })
}

/// Require a value to be non-empty after trimming, returning the trimmed value.
pub fn require_non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty {
            field: field.to_string(),
        });
    }
    Ok(trimmed)
}

/// Validate a resource name (project, team, feed, repository, wiki).
pub fn validate_name<'a>(
    field: &str,
    value: &'a str,
    max_len: usize,
) -> Result<&'a str, ValidationError> {
    let name = require_non_empty(field, value)?;

    if name.chars().count() > max_len {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: max_len,
        });
    }

    let mut bad: Vec<char> = name
        .chars()
        .filter(|c| c.is_control() || FORBIDDEN_NAME_CHARS.contains(c))
        .collect();
    if name.starts_with('_') {
        bad.push('_');
    }
    if name.ends_with('.') {
        bad.push('.');
    }

    if !bad.is_empty() {
        bad.dedup();
        return Err(ValidationError::InvalidCharacters {
            field: field.to_string(),
            characters: bad
                .into_iter()
                .map(|c| {
                    if c.is_control() {
                        format!("U+{:04X}", c as u32)
                    } else {
                        c.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        });
    }

    Ok(name)
}

/// Qualify a branch name as `refs/heads/<name>` and check it against git's ref rules.
///
/// Already-qualified references (`refs/...`) are validated but left as is.
pub fn normalize_branch_ref(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    let invalid = || ValidationError::InvalidReference {
        reference: name.to_string(),
    };

    if trimmed.is_empty()
        || trimmed.starts_with('/')
        || trimmed.ends_with('/')
        || trimmed.ends_with(".lock")
        || trimmed.ends_with('.')
        || trimmed == "@"
        || git_ref_forbidden_regex().is_match(trimmed)
    {
        return Err(invalid());
    }

    if trimmed.starts_with("refs/") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("refs/heads/{}", trimmed))
    }
}

/// Escape a value for use inside a single-quoted WIQL string literal.
pub fn escape_wiql_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Basic sanity check for a WIQL query.
pub fn validate_wiql(query: &str) -> Result<&str, ValidationError> {
    let query = require_non_empty("wiql", query)?;
    let starts_with_select = query
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("select"));
    if !starts_with_select {
        return Err(ValidationError::Invalid {
            field: "wiql".to_string(),
            message: "query must begin with SELECT".to_string(),
        });
    }
    Ok(query)
}

/// Normalize a wiki page path: leading slash, no duplicate or trailing slashes.
pub fn normalize_wiki_path(path: &str) -> Result<String, ValidationError> {
    let segments: Vec<&str> = path
        .trim()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.iter().any(|s| *s == ".." || *s == ".") {
        return Err(ValidationError::InvalidPath {
            path: path.to_string(),
        });
    }
    if segments.iter().any(|s| s.chars().any(char::is_control)) {
        return Err(ValidationError::InvalidPath {
            path: path.to_string(),
        });
    }

    Ok(format!("/{}", segments.join("/")))
}

/// Check a page size or result limit against `1..=max`.
pub fn validate_top(field: &str, value: i32, max: i32) -> Result<i32, ValidationError> {
    if !(1..=max).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: max as i64,
            value: value as i64,
        });
    }
    Ok(value)
}

/// Validate a list of numeric ids: non-empty, positive, deduplicated in order.
pub fn validate_ids(field: &str, ids: &[i32]) -> Result<Vec<i32>, ValidationError> {
    if ids.is_empty() {
        return Err(ValidationError::Empty {
            field: field.to_string(),
        });
    }
    if let Some(bad) = ids.iter().find(|id| **id <= 0) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: i32::MAX as i64,
            value: *bad as i64,
        });
    }

    let mut seen = HashSet::new();
    Ok(ids.iter().copied().filter(|id| seen.insert(*id)).collect())
}

/// Pick the per-call project, falling back to the configured default.
pub fn resolve_project(
    requested: Option<&str>,
    default: Option<&str>,
) -> Result<String, ValidationError> {
    requested
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .or_else(|| default.map(str::trim).filter(|p| !p.is_empty()))
        .map(str::to_string)
        .ok_or(ValidationError::MissingProject)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// # Name Validation
    ///
    /// Tests resource name rules.
    ///
    /// ## Test Scenario
    /// - Validates clean names, names with forbidden characters, and long names
    ///
    /// ## Expected Outcome
    /// - Clean names pass trimmed, invalid ones name the offending characters
    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("feed", "  my-feed ", 64).unwrap(), "my-feed");

        let err = validate_name("feed", "bad/name?", 64).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidCharacters {
                field: "feed".to_string(),
                characters: "/ ?".to_string(),
            }
        );

        assert!(matches!(
            validate_name("team", "_hidden", 64),
            Err(ValidationError::InvalidCharacters { .. })
        ));
        assert!(matches!(
            validate_name("team", "trailing.", 64),
            Err(ValidationError::InvalidCharacters { .. })
        ));
        assert!(matches!(
            validate_name("project", &"x".repeat(65), 64),
            Err(ValidationError::TooLong { max: 64, .. })
        ));
        assert!(matches!(
            validate_name("project", "   ", 64),
            Err(ValidationError::Empty { .. })
        ));
    }

    /// # Branch Reference Normalization
    ///
    /// Tests qualification and git ref format checks.
    ///
    /// ## Test Scenario
    /// - Normalizes short names, qualified refs and malformed refs
    ///
    /// ## Expected Outcome
    /// - Short names gain refs/heads/, malformed refs are rejected
    #[test]
    fn test_normalize_branch_ref() {
        assert_eq!(normalize_branch_ref("main").unwrap(), "refs/heads/main");
        assert_eq!(
            normalize_branch_ref("feature/login").unwrap(),
            "refs/heads/feature/login"
        );
        assert_eq!(
            normalize_branch_ref("refs/tags/v1.0").unwrap(),
            "refs/tags/v1.0"
        );

        for bad in [
            "",
            "has space",
            "a..b",
            "topic.lock",
            "/leading",
            "trailing/",
            "we@{ird",
            "star*",
            "double//slash",
            "caret^",
        ] {
            assert!(
                normalize_branch_ref(bad).is_err(),
                "expected '{}' to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_escape_wiql_literal() {
        assert_eq!(escape_wiql_literal("O'Brien"), "O''Brien");
        assert_eq!(escape_wiql_literal("plain"), "plain");
    }

    #[test]
    fn test_validate_wiql() {
        assert!(validate_wiql("SELECT [System.Id] FROM WorkItems").is_ok());
        assert!(validate_wiql("  select [System.Id] from workitems").is_ok());
        assert_eq!(
            validate_wiql("DELETE FROM WorkItems").unwrap_err().to_string(),
            "Invalid wiql: query must begin with SELECT"
        );
        assert!(validate_wiql("").is_err());
        assert!(validate_wiql("sel").is_err());
    }

    /// # Wiki Path Normalization
    ///
    /// Tests normalization of user-supplied wiki page paths.
    ///
    /// ## Test Scenario
    /// - Normalizes paths with missing, duplicated and trailing slashes
    /// - Rejects traversal segments
    ///
    /// ## Expected Outcome
    /// - Paths have a single leading slash and no traversal
    #[test]
    fn test_normalize_wiki_path() {
        assert_eq!(normalize_wiki_path("Home").unwrap(), "/Home");
        assert_eq!(
            normalize_wiki_path("//Team//Onboarding/").unwrap(),
            "/Team/Onboarding"
        );
        assert_eq!(normalize_wiki_path("/").unwrap(), "/");
        assert_eq!(normalize_wiki_path("").unwrap(), "/");
        assert!(normalize_wiki_path("/a/../b").is_err());
    }

    #[test]
    fn test_validate_top() {
        assert_eq!(validate_top("top", 50, 200).unwrap(), 50);
        assert!(validate_top("top", 0, 200).is_err());
        assert!(validate_top("top", 201, 200).is_err());
    }

    #[test]
    fn test_validate_ids() {
        assert_eq!(validate_ids("ids", &[3, 1, 3, 2]).unwrap(), vec![3, 1, 2]);
        assert!(validate_ids("ids", &[]).is_err());
        assert!(matches!(
            validate_ids("ids", &[1, -4]),
            Err(ValidationError::OutOfRange { value: -4, .. })
        ));
    }

    /// # Project Resolution
    ///
    /// Tests the per-call override of the default project.
    ///
    /// ## Test Scenario
    /// - Resolves with argument, default only, blank argument and neither
    ///
    /// ## Expected Outcome
    /// - Argument wins, blank falls back, absence is MissingProject
    #[test]
    fn test_resolve_project() {
        assert_eq!(resolve_project(Some("Other"), Some("Default")).unwrap(), "Other");
        assert_eq!(resolve_project(None, Some("Default")).unwrap(), "Default");
        assert_eq!(resolve_project(Some("  "), Some("Default")).unwrap(), "Default");
        assert_eq!(
            resolve_project(None, None).unwrap_err(),
            ValidationError::MissingProject
        );
    }
}
