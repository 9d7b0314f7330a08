//! Route matching logic.
//!
//! # Responsibilities
//! - Normalise configured path patterns into a prefix
//! - Match request paths against the prefix on `/` segment boundaries
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - `/api/users`, `/api/users/` and `/api/users/**` are the same pattern
//! - No regex to guarantee O(n) matching

/// Matches the request path prefix, aligned on `/` segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    /// Normalised prefix, never ending in `/` unless it is exactly `/`.
    prefix: String,
}

impl PathPrefixMatcher {
    /// Build a matcher from a configured pattern.
    ///
    /// Accepts plain prefixes and the trailing `/**` glob form.
    pub fn new(pattern: &str) -> Result<Self, String> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err("path pattern is empty".to_string());
        }
        if !pattern.starts_with('/') {
            return Err(format!("path pattern '{pattern}' must start with '/'"));
        }

        let stripped = pattern.strip_suffix("/**").unwrap_or(pattern);
        if stripped.contains('*') {
            return Err(format!(
                "path pattern '{pattern}' may only use a trailing '/**' wildcard"
            ));
        }

        let trimmed = stripped.trim_end_matches('/');
        let prefix = if trimmed.is_empty() { "/" } else { trimmed };

        Ok(Self {
            prefix: prefix.to_string(),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns true if `path` equals the prefix or continues it with a new segment.
    pub fn matches(&self, path: &str) -> bool {
        if self.prefix == "/" {
            return path.starts_with('/');
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}
