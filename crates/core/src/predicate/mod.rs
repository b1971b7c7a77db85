//! Adapter selection predicates.
//!
//! A small boolean language over adapter metadata, used to pick the adapters
//! that participate in an aggregate view:
//!
//! ```text
//! lang:en+!type:private,group:favorites
//! ```
//!
//! `,` is OR (loosest), `+` is AND, a leading `!` negates (tightest). Atoms are
//! `keyword:argument`, where the keyword is looked up in a [`KeywordRegistry`].

mod keywords;
mod parser;
mod registry;

pub use registry::{KeywordBuilder, KeywordRegistry};

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::adapter::AdapterMetadata;

/// Errors raised while registering keywords or parsing expressions.
///
/// These are configuration-time errors and should abort setup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PredicateError {
    #[error("Malformed filter expression '{expression}': {reason}")]
    Malformed { expression: String, reason: String },

    #[error("Invalid argument '{argument}' for keyword '{keyword}', expected one of: {expected}")]
    InvalidArgument {
        keyword: String,
        argument: String,
        expected: String,
    },

    #[error("Keyword already registered: {0}")]
    DuplicateKeyword(String),

    #[error("Invalid keyword name: '{0}'")]
    InvalidKeyword(String),
}

impl PredicateError {
    pub(crate) fn invalid_argument(keyword: &str, argument: &str, expected: &[&str]) -> Self {
        Self::InvalidArgument {
            keyword: keyword.to_string(),
            argument: argument.to_string(),
            expected: expected.join("|"),
        }
    }
}

/// A stateless, reusable test over adapter metadata.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&AdapterMetadata) -> bool + Send + Sync>);

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&AdapterMetadata) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// A predicate that ignores the adapter.
    pub fn constant(value: bool) -> Self {
        Self::new(move |_| value)
    }

    pub fn matches(&self, adapter: &AdapterMetadata) -> bool {
        (self.0)(adapter)
    }

    pub fn and(self, other: Predicate) -> Self {
        Self::new(move |a| self.matches(a) && other.matches(a))
    }

    pub fn or(self, other: Predicate) -> Self {
        Self::new(move |a| self.matches(a) || other.matches(a))
    }

    pub fn negate(self) -> Self {
        Self::new(move |a| !self.matches(a))
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(<fn>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinators() {
        let adapter = AdapterMetadata::new("x");
        let t = Predicate::constant(true);
        let f = Predicate::constant(false);

        assert!(t.clone().or(f.clone()).matches(&adapter));
        assert!(!t.clone().and(f.clone()).matches(&adapter));
        assert!(f.negate().matches(&adapter));
        assert!(!t.negate().matches(&adapter));
    }

    #[test]
    fn test_error_display() {
        let err = PredicateError::invalid_argument("status", "sick", &["healthy", "failing"]);
        assert_eq!(
            err.to_string(),
            "Invalid argument 'sick' for keyword 'status', expected one of: healthy|failing"
        );
    }
}
