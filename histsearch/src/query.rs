//! Query tokenization
//!
//! A query is the list of whitespace-free terms in the raw input, in
//! left-to-right order. Scoring does not depend on term order.

use tracing::trace;

/// A term must be non-empty and must not contain a space.
fn is_valid_term(term: &str) -> bool {
    !term.is_empty() && !term.contains(' ')
}

/// Split raw input on runs of whitespace and drop invalid terms.
pub fn tokenize(input: &str) -> Vec<String> {
    input
        .split_whitespace()
        .filter(|term| is_valid_term(term))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    terms: Vec<String>,
}

impl Query {
    /// Terms in input order. This is what a ranking pass scores with.
    pub fn raw(input: &str) -> Self {
        let terms = tokenize(input);
        trace!(terms = %format_terms(&terms), "raw query");
        Self { terms }
    }

    /// Terms stably sorted by ascending length, for presentation.
    pub fn by_length(input: &str) -> Self {
        let mut terms = tokenize(input);
        terms.sort_by_key(|t| t.len());
        trace!(terms = %format_terms(&terms), "length-sorted query");
        Self { terms }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

fn format_terms(terms: &[String]) -> String {
    terms.iter().map(|t| format!("<{}>", t)).collect::<Vec<_>>().join(" ")
}
