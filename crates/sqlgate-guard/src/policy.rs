//! Forbidden-keyword policy.
//!
//! The policy is a plain set of uppercase keywords. It is configuration,
//! not hard-coded behavior: deployments extend it (or replace it) without
//! code changes, and the validator only consults it through
//! [`KeywordPolicy::canonical`].

use std::collections::HashSet;

/// Keywords forbidden by default.
///
/// Every data-modifying or DDL statement verb PostgreSQL accepts at
/// statement level, plus procedure-invocation verbs. Removing the
/// data-modifying verbs from a custom policy weakens the defense against
/// data-modifying common-table-expression bodies (`WITH x AS (DELETE ...)
/// SELECT ...`), which the statement-shape check alone does not see.
pub const DEFAULT_FORBIDDEN_KEYWORDS: &[&str] = &[
    "DROP",
    "DELETE",
    "INSERT",
    "UPDATE",
    "ALTER",
    "TRUNCATE",
    "GRANT",
    "REVOKE",
    "CREATE",
    "EXEC",
    "EXECUTE",
    "ATTACH",
    "DETACH",
    "COPY",
    "CALL",
    "MERGE",
];

/// An extensible set of forbidden keywords, matched case-insensitively
/// against word tokens.
#[derive(Debug, Clone)]
pub struct KeywordPolicy {
    forbidden: HashSet<String>,
}

impl KeywordPolicy {
    /// Build a policy from an explicit keyword list, replacing the
    /// default set entirely.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            forbidden: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_ascii_uppercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Add a keyword to the policy.
    pub fn forbid(&mut self, keyword: &str) {
        let keyword = keyword.trim();
        if !keyword.is_empty() {
            self.forbidden.insert(keyword.to_ascii_uppercase());
        }
    }

    /// Builder-style [`forbid`](Self::forbid).
    #[must_use]
    pub fn with(mut self, keyword: &str) -> Self {
        self.forbid(keyword);
        self
    }

    /// Look up `word` case-insensitively; on a hit, return the canonical
    /// uppercase keyword for reporting.
    #[must_use]
    pub fn canonical(&self, word: &str) -> Option<&str> {
        self.forbidden
            .get(&word.to_ascii_uppercase())
            .map(String::as_str)
    }

    /// Check whether `word` is forbidden, ignoring case.
    #[must_use]
    pub fn is_forbidden(&self, word: &str) -> bool {
        self.canonical(word).is_some()
    }

    /// Number of keywords in the policy.
    #[must_use]
    pub fn len(&self) -> usize {
        self.forbidden.len()
    }

    /// Whether the policy forbids nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forbidden.is_empty()
    }
}

impl Default for KeywordPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_FORBIDDEN_KEYWORDS.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_covers_write_verbs() {
        let policy = KeywordPolicy::default();
        for kw in ["DROP", "delete", "Insert", "MERGE", "exec"] {
            assert!(policy.is_forbidden(kw), "{kw} should be forbidden");
        }
        assert_eq!(policy.len(), DEFAULT_FORBIDDEN_KEYWORDS.len());
    }

    #[test]
    fn test_identifiers_containing_keywords_pass() {
        let policy = KeywordPolicy::default();
        assert!(!policy.is_forbidden("drop_log"));
        assert!(!policy.is_forbidden("updated_at"));
        assert!(!policy.is_forbidden("grants"));
    }

    #[test]
    fn test_canonical_reports_uppercase() {
        let policy = KeywordPolicy::default();
        assert_eq!(policy.canonical("delete"), Some("DELETE"));
        assert_eq!(policy.canonical("nothing"), None);
    }

    #[test]
    fn test_extension_without_code_change() {
        let mut policy = KeywordPolicy::default();
        assert!(!policy.is_forbidden("VACUUM"));
        policy.forbid("vacuum");
        assert!(policy.is_forbidden("VACUUM"));

        let policy = KeywordPolicy::default().with("reindex");
        assert_eq!(policy.canonical("ReIndex"), Some("REINDEX"));
    }

    #[test]
    fn test_replacement_policy() {
        let policy = KeywordPolicy::new(["drop"]);
        assert!(policy.is_forbidden("DROP"));
        assert!(!policy.is_forbidden("DELETE"));
        assert_eq!(policy.len(), 1);
    }

    #[test]
    fn test_blank_entries_ignored() {
        let policy = KeywordPolicy::new(["", "  ", "drop"]);
        assert_eq!(policy.len(), 1);
    }
}
