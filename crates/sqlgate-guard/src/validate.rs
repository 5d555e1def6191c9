//! Statement validation.
//!
//! `validate` is a pure function from SQL text to a [`Verdict`]. Checks
//! run in a fixed order, first hit wins:
//!
//! 1. nothing but trivia → [`RejectReason::Empty`]
//! 2. outermost statement shape is not `SELECT` (or `WITH ... SELECT`) →
//!    [`RejectReason::NotASelect`]
//! 3. a statement separator with anything after it →
//!    [`RejectReason::MultipleStatements`] (one trailing `;` is tolerated
//!    and stripped)
//! 4. a forbidden keyword appearing as a real word token →
//!    [`RejectReason::ForbiddenKeyword`]
//!
//! Because matching happens on the token stream, keywords inside string
//! literals, quoted identifiers, or comments never reject, and keywords
//! glued into longer identifiers (`drop_log`) never reject either.

use thiserror::Error;

use crate::lexer::{Lexer, Token, TokenKind};
use crate::policy::KeywordPolicy;

/// Longest text echoed back in a `NotASelect` rejection.
const FOUND_MAX_CHARS: usize = 32;

/// Why a statement was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// The input contained no SQL at all (empty, whitespace, or comments
    /// only).
    #[error("empty query text")]
    Empty,
    /// The outermost statement is not a plain `SELECT` (or a `WITH`
    /// chain ending in one). `found` names the offending leading token.
    #[error("only SELECT statements are allowed (found: {found})")]
    NotASelect {
        /// The statement verb (or other token) found where `SELECT` was
        /// required, uppercased for words.
        found: String,
    },
    /// More than one statement was supplied.
    #[error("multiple SQL statements are not allowed")]
    MultipleStatements,
    /// A forbidden keyword appeared as a real token.
    #[error("forbidden keyword: {0}")]
    ForbiddenKeyword(String),
}

/// Outcome of validating one candidate statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The statement is a single read-only `SELECT`. `sql` is the text
    /// to execute: trimmed, with the tolerated trailing `;` stripped,
    /// otherwise unmodified.
    Accepted {
        /// Executable statement text.
        sql: String,
    },
    /// The statement was refused.
    Rejected {
        /// Machine-readable rejection reason.
        reason: RejectReason,
    },
}

impl Verdict {
    /// Whether the statement was accepted.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Executable SQL text, if accepted.
    #[must_use]
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Accepted { sql } => Some(sql),
            Self::Rejected { .. } => None,
        }
    }

    /// Rejection reason, if rejected.
    #[must_use]
    pub fn reason(&self) -> Option<&RejectReason> {
        match self {
            Self::Accepted { .. } => None,
            Self::Rejected { reason } => Some(reason),
        }
    }
}

/// Statement validator: a [`KeywordPolicy`] plus the fixed shape checks.
///
/// Cheap to clone; deterministic; no I/O.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    policy: KeywordPolicy,
}

impl Validator {
    /// Create a validator with an explicit policy.
    #[must_use]
    pub fn new(policy: KeywordPolicy) -> Self {
        Self { policy }
    }

    /// The active keyword policy.
    #[must_use]
    pub fn policy(&self) -> &KeywordPolicy {
        &self.policy
    }

    /// Validate one candidate statement.
    #[must_use]
    pub fn validate(&self, text: &str) -> Verdict {
        let trimmed = text.trim();
        let tokens: Vec<Token<'_>> = Lexer::new(trimmed).collect();

        if tokens.is_empty() {
            return Self::reject(RejectReason::Empty);
        }

        if let Err(found) = statement_shape(&tokens) {
            return Self::reject(RejectReason::NotASelect { found });
        }

        let mut end = trimmed.len();
        if let Some(semi) = tokens.iter().position(|t| t.kind == TokenKind::Semicolon) {
            if semi + 1 < tokens.len() {
                return Self::reject(RejectReason::MultipleStatements);
            }
            end = tokens[semi].start;
        }

        for token in &tokens {
            if token.kind == TokenKind::Word {
                if let Some(keyword) = self.policy.canonical(token.text) {
                    return Self::reject(RejectReason::ForbiddenKeyword(keyword.to_string()));
                }
            }
        }

        Verdict::Accepted {
            sql: trimmed[..end].trim_end().to_string(),
        }
    }

    fn reject(reason: RejectReason) -> Verdict {
        tracing::debug!(%reason, "statement rejected");
        Verdict::Rejected { reason }
    }
}

/// Check that the outermost statement is a `SELECT`, or a `WITH` whose
/// common-table-expression list leads to one. On failure returns the
/// token found where `SELECT` was required.
///
/// The walk covers `WITH [RECURSIVE] name [(cols)] AS [[NOT]
/// MATERIALIZED] (...)` lists and tolerates statements wrapped in
/// parentheses. Anything the walk cannot account for is a rejection:
/// a statement whose shape cannot be established is not provably a read.
fn statement_shape(tokens: &[Token<'_>]) -> Result<(), String> {
    let mut i = 0;
    while tokens.get(i).is_some_and(|t| t.kind == TokenKind::LeftParen) {
        i += 1;
    }
    let Some(first) = tokens.get(i) else {
        return Err("(".to_string());
    };
    if first.kind != TokenKind::Word {
        return Err(found_text(first));
    }
    if first.text.eq_ignore_ascii_case("select") {
        return Ok(());
    }
    if !first.text.eq_ignore_ascii_case("with") {
        return Err(found_text(first));
    }

    i += 1;
    if tokens.get(i).is_some_and(|t| t.word_eq("recursive")) {
        i += 1;
    }
    loop {
        match tokens.get(i) {
            Some(t) if matches!(t.kind, TokenKind::Word | TokenKind::QuotedIdentifier) => i += 1,
            _ => return Err("WITH".to_string()),
        }
        if tokens.get(i).is_some_and(|t| t.kind == TokenKind::LeftParen) {
            i = skip_group(tokens, i)?;
        }
        if !tokens.get(i).is_some_and(|t| t.word_eq("as")) {
            return Err("WITH".to_string());
        }
        i += 1;
        if tokens.get(i).is_some_and(|t| t.word_eq("not")) {
            i += 1;
            if !tokens.get(i).is_some_and(|t| t.word_eq("materialized")) {
                return Err("WITH".to_string());
            }
            i += 1;
        } else if tokens.get(i).is_some_and(|t| t.word_eq("materialized")) {
            i += 1;
        }
        if !tokens.get(i).is_some_and(|t| t.kind == TokenKind::LeftParen) {
            return Err("WITH".to_string());
        }
        i = skip_group(tokens, i)?;
        if tokens.get(i).is_some_and(|t| t.kind == TokenKind::Comma) {
            i += 1;
        } else {
            break;
        }
    }

    while tokens.get(i).is_some_and(|t| t.kind == TokenKind::LeftParen) {
        i += 1;
    }
    match tokens.get(i) {
        Some(t) if t.word_eq("select") => Ok(()),
        Some(t) => Err(found_text(t)),
        None => Err("WITH".to_string()),
    }
}

/// Skip a balanced parenthesized group starting at `open` (which must be
/// a `(` token); returns the index just past the matching `)`.
fn skip_group(tokens: &[Token<'_>], open: usize) -> Result<usize, String> {
    let mut depth = 0usize;
    let mut i = open;
    while let Some(t) = tokens.get(i) {
        match t.kind {
            TokenKind::LeftParen => depth += 1,
            TokenKind::RightParen => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err("WITH".to_string())
}

fn found_text(token: &Token<'_>) -> String {
    let text = if token.kind == TokenKind::Word {
        token.text.to_ascii_uppercase()
    } else {
        token.text.to_string()
    };
    if text.chars().count() > FOUND_MAX_CHARS {
        text.chars().take(FOUND_MAX_CHARS).collect()
    } else {
        text
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn validator() -> Validator {
        Validator::default()
    }

    fn reason_of(text: &str) -> RejectReason {
        validator().validate(text).reason().unwrap().clone()
    }

    #[test]
    fn test_plain_select_accepted() {
        let verdict = validator().validate("SELECT region, revenue FROM sales_daily");
        assert!(verdict.is_accepted());
        assert_eq!(verdict.sql(), Some("SELECT region, revenue FROM sales_daily"));
    }

    #[test]
    fn test_trailing_semicolon_tolerated_and_stripped() {
        let verdict = validator().validate("SELECT 1;");
        assert_eq!(verdict.sql(), Some("SELECT 1"));

        let verdict = validator().validate("SELECT 1 ;  ");
        assert_eq!(verdict.sql(), Some("SELECT 1"));
    }

    #[test]
    fn test_semicolon_then_comment_is_still_trailing() {
        let verdict = validator().validate("SELECT 1; -- all done");
        assert_eq!(verdict.sql(), Some("SELECT 1"));
    }

    #[test]
    fn test_multiple_statements_rejected() {
        assert_eq!(
            reason_of("SELECT 1; DROP TABLE x;"),
            RejectReason::MultipleStatements
        );
        assert_eq!(reason_of("SELECT 1;;"), RejectReason::MultipleStatements);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(reason_of(""), RejectReason::Empty);
        assert_eq!(reason_of("   \n\t"), RejectReason::Empty);
        assert_eq!(reason_of("-- nothing"), RejectReason::Empty);
        assert_eq!(reason_of("/* nothing */"), RejectReason::Empty);
    }

    #[test]
    fn test_non_select_names_the_verb() {
        let reason = reason_of("DELETE FROM sales_daily");
        assert_eq!(
            reason,
            RejectReason::NotASelect {
                found: "DELETE".to_string()
            }
        );
        // The rendered message must name the verb for the caller.
        assert!(reason.to_string().contains("DELETE"));

        assert_eq!(
            reason_of("truncate table sales_daily"),
            RejectReason::NotASelect {
                found: "TRUNCATE".to_string()
            }
        );
    }

    #[test]
    fn test_shape_check_runs_before_keyword_scan() {
        // DROP is also a forbidden keyword, but the shape check fires
        // first, so the reason is NotASelect.
        assert!(matches!(
            reason_of("DROP TABLE x"),
            RejectReason::NotASelect { .. }
        ));
    }

    #[test]
    fn test_keyword_inside_string_literal_accepted() {
        assert!(validator().validate("SELECT 'please drop by'").is_accepted());
        assert!(validator()
            .validate("SELECT * FROM notes WHERE body = 'DELETE FROM x'")
            .is_accepted());
        assert!(validator()
            .validate("SELECT $tag$DROP TABLE x$tag$")
            .is_accepted());
        assert!(validator().validate(r"SELECT E'it\'s a DROP'").is_accepted());
    }

    #[test]
    fn test_keyword_inside_quoted_identifier_accepted() {
        assert!(validator().validate(r#"SELECT "drop" FROM t"#).is_accepted());
    }

    #[test]
    fn test_keyword_inside_comment_accepted() {
        assert!(validator()
            .validate("SELECT 1 /* DROP TABLE x */ FROM t")
            .is_accepted());
    }

    #[test]
    fn test_keyword_glued_to_identifier_accepted() {
        // The original substring approach would reject these.
        assert!(validator().validate("SELECT * FROM drop_log").is_accepted());
        assert!(validator()
            .validate("SELECT updated_at, grants FROM audit")
            .is_accepted());
    }

    #[test]
    fn test_forbidden_keyword_as_token_rejected() {
        // Even in identifier position a bare forbidden verb rejects;
        // over-rejection is the accepted trade-off.
        assert_eq!(
            reason_of("SELECT * FROM exec"),
            RejectReason::ForbiddenKeyword("EXEC".to_string())
        );
        assert_eq!(
            reason_of("SELECT delete FROM t"),
            RejectReason::ForbiddenKeyword("DELETE".to_string())
        );
    }

    #[test]
    fn test_leading_comment_then_select() {
        assert!(validator()
            .validate("-- revenue query\nSELECT SUM(revenue) FROM sales_daily")
            .is_accepted());
        assert!(validator().validate("/* x */ SELECT 1").is_accepted());
    }

    #[test]
    fn test_parenthesized_select() {
        assert!(validator().validate("(SELECT 1)").is_accepted());
        assert!(validator().validate("((SELECT 1))").is_accepted());
    }

    #[test]
    fn test_with_select_accepted() {
        assert!(validator()
            .validate("WITH t AS (SELECT region FROM sales_daily) SELECT * FROM t")
            .is_accepted());
        assert!(validator()
            .validate(
                "WITH RECURSIVE t(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM t WHERE n < 5) \
                 SELECT n FROM t"
            )
            .is_accepted());
        assert!(validator()
            .validate("WITH a AS (SELECT 1), b AS MATERIALIZED (SELECT 2) SELECT * FROM a, b")
            .is_accepted());
        assert!(validator()
            .validate("WITH a AS NOT MATERIALIZED (SELECT 1) (SELECT * FROM a)")
            .is_accepted());
    }

    #[test]
    fn test_cte_wrapping_a_write_rejected() {
        // Outermost shape is fine; the keyword scan still sees DELETE.
        assert_eq!(
            reason_of("WITH gone AS (DELETE FROM sales_daily RETURNING *) SELECT * FROM gone"),
            RejectReason::ForbiddenKeyword("DELETE".to_string())
        );
    }

    #[test]
    fn test_with_ending_in_write_rejected() {
        assert_eq!(
            reason_of("WITH t AS (SELECT 1) INSERT INTO y SELECT * FROM t"),
            RejectReason::NotASelect {
                found: "INSERT".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_with_rejected() {
        assert!(matches!(
            reason_of("WITH t SELECT 1"),
            RejectReason::NotASelect { .. }
        ));
        assert!(matches!(
            reason_of("WITH t AS (SELECT 1"),
            RejectReason::NotASelect { .. }
        ));
        assert!(matches!(reason_of("WITH"), RejectReason::NotASelect { .. }));
    }

    #[test]
    fn test_subquery_inside_rejected_statement_still_rejects() {
        assert!(matches!(
            reason_of("INSERT INTO t SELECT * FROM s"),
            RejectReason::NotASelect { .. }
        ));
    }

    #[test]
    fn test_non_word_leading_token() {
        assert_eq!(
            reason_of("123 SELECT"),
            RejectReason::NotASelect {
                found: "123".to_string()
            }
        );
        assert!(matches!(reason_of(";"), RejectReason::NotASelect { .. }));
    }

    #[test]
    fn test_custom_policy_extension() {
        let validator = Validator::new(KeywordPolicy::default().with("vacuum"));
        assert_eq!(
            validator
                .validate("SELECT vacuum FROM t")
                .reason()
                .unwrap()
                .clone(),
            RejectReason::ForbiddenKeyword("VACUUM".to_string())
        );
    }

    #[test]
    fn test_unterminated_string_is_not_rejected_here() {
        // Lenient lexing: the open literal swallows the rest, the server
        // reports the syntax error itself.
        assert!(validator().validate("SELECT 'oops; DROP TABLE x").is_accepted());
    }

    proptest! {
        #[test]
        fn prop_validate_never_panics(text in ".*") {
            let _ = validator().validate(&text);
        }

        #[test]
        fn prop_literal_content_never_rejects(content in "[a-zA-Z0-9 _,.]{0,40}") {
            let sql = format!("SELECT '{content}'");
            prop_assert!(validator().validate(&sql).is_accepted());
        }

        #[test]
        fn prop_other_statement_verbs_reject(verb in "[A-Za-z_][A-Za-z0-9_]{0,12}") {
            prop_assume!(!verb.eq_ignore_ascii_case("select"));
            prop_assume!(!verb.eq_ignore_ascii_case("with"));
            let sql = format!("{verb} something FROM t");
            let verdict = validator().validate(&sql);
            prop_assert!(
                matches!(verdict.reason(), Some(RejectReason::NotASelect { .. })),
                "expected NotASelect rejection, got {:?}",
                verdict.reason()
            );
        }

        #[test]
        fn prop_trailing_semicolon_equivalent(tail in "[a-z_][a-z0-9_]{0,10}") {
            let base = format!("SELECT {tail} FROM t");
            let with_semi = format!("{base};");
            let a = validator().validate(&base);
            let b = validator().validate(&with_semi);
            prop_assert_eq!(a.sql(), b.sql());
        }
    }
}
