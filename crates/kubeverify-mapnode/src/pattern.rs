//! # Wildcard Patterns
//!
//! Glob-style matching shared by ignore-field filters and policy selectors.
//! The only metacharacter is `*`, which spans any run of characters
//! (including `.` and `/`). Everything else matches literally.

use regex::Regex;

/// Matches `value` against a glob `pattern`.
///
/// An empty pattern never matches; `"*"` matches every value.
///
/// # Example
///
/// ```rust
/// use kubeverify_mapnode::match_pattern;
///
/// assert!(match_pattern("kube-*", "kube-system"));
/// assert!(match_pattern("*", ""));
/// assert!(!match_pattern("kube-*", "default"));
/// ```
pub fn match_pattern(pattern: &str, value: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    if pattern == "*" {
        return true;
    }
    if !pattern.contains('*') {
        return pattern == value;
    }

    let expr = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    match Regex::new(&format!("^{}$", expr)) {
        Ok(re) => re.is_match(value),
        Err(_) => false,
    }
}

/// Matches a flattened diff key against an ignore-field pattern.
///
/// A pattern matches when it equals the key, when the key lies beneath it
/// (`status` matches `status.phase`), or when it glob-matches the key.
///
/// # Example
///
/// ```rust
/// use kubeverify_mapnode::matches_path;
///
/// assert!(matches_path("status", "status.conditions.0.type"));
/// assert!(matches_path("metadata.annotations.*", "metadata.annotations.a/b"));
/// assert!(!matches_path("status", "statusCode"));
/// ```
pub fn matches_path(pattern: &str, key: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    if pattern == key {
        return true;
    }
    if key.len() > pattern.len() && key.starts_with(pattern) && key[pattern.len()..].starts_with('.') {
        return true;
    }
    pattern.contains('*') && match_pattern(pattern, key)
}
