//! # sqlgate-guard
//!
//! Lexical safety validation for machine-generated SQL.
//!
//! Untrusted statement text (typically produced by a language model) is
//! tokenized with a small quote-aware lexer and vetted against a fixed
//! rule set before it goes anywhere near a database: the outermost
//! statement must be a `SELECT` (or a `WITH` chain ending in one), only
//! one statement is allowed per request, and a configurable set of
//! write/DDL keywords is refused wherever it appears as a real token.
//! Matching on tokens rather than substrings means `SELECT 'please drop
//! by'` and `SELECT * FROM drop_log` both pass.
//!
//! No parsing beyond statement shape is attempted. The validator is a
//! coarse pre-filter; the database remains the authority on syntax, and
//! a read-only role remains the authority on permissions.
//!
//! ## Features
//!
//! - Quote-aware tokenizer covering `'...'`, `E'...'`, dollar-quoted
//!   strings, `"quoted identifiers"`, and both comment forms
//! - Outer-statement shape check with `WITH ... SELECT` support
//! - Single-statement enforcement (one trailing `;` tolerated)
//! - Configurable forbidden-keyword policy with a conservative default
//!
//! ## Example
//!
//! ```rust
//! use sqlgate_guard::Validator;
//!
//! let validator = Validator::default();
//!
//! let verdict = validator.validate("SELECT region FROM sales_daily;");
//! assert_eq!(verdict.sql(), Some("SELECT region FROM sales_daily"));
//!
//! let verdict = validator.validate("DROP TABLE sales_daily");
//! assert!(!verdict.is_accepted());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod lexer;
pub mod policy;
pub mod validate;

pub use lexer::{Lexer, Token, TokenKind};
pub use policy::{KeywordPolicy, DEFAULT_FORBIDDEN_KEYWORDS};
pub use validate::{RejectReason, Validator, Verdict};
