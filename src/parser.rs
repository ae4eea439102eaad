//! Analogy-style query parsing
//!
//! A query is a whitespace-separated token sequence where a bare `+` or `-`
//! sets the sign applied to the terms that follow it:
//!
//! ```text
//! king - man + woman   =>   +king  -man  +woman
//! ```
//!
//! The sign defaults to `+1` and persists until overridden, so `a - b c`
//! subtracts both `b` and `c`. Operators embedded inside a token (`co-op`)
//! do not split it.
use serde::Serialize;

/// One query term with the sign in effect at its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedTerm {
    /// `+1` or `-1`.
    pub sign: i32,
    pub token: String,
}

impl SignedTerm {
    fn new(sign: i32, token: &str) -> Self {
        Self {
            sign,
            token: token.to_string(),
        }
    }
}

/// Parse a query string into signed terms, in order of first appearance.
///
/// A query with no terms at all yields a single empty-string term carrying
/// the final sign (`+1` for empty or all-whitespace input), matching the
/// behavior callers of the original interface rely on.
pub fn parse_query(query: &str) -> Vec<SignedTerm> {
    let mut terms = Vec::new();
    let mut sign = 1;

    for token in query.split_whitespace() {
        match token {
            "+" => sign = 1,
            "-" => sign = -1,
            _ => terms.push(SignedTerm::new(sign, token)),
        }
    }

    if terms.is_empty() {
        terms.push(SignedTerm::new(sign, ""));
    }

    terms
}
