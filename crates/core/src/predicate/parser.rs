//! Recursive-descent parser for predicate expressions.
//!
//! Operators are split in increasing precedence: `,` first, then `+`, then a
//! leading `!`. Splitting on the last occurrence makes both binary operators
//! left-associative.

use super::{KeywordRegistry, Predicate, PredicateError};

pub(crate) fn parse_expression(
    registry: &KeywordRegistry,
    expression: &str,
) -> Result<Predicate, PredicateError> {
    Parser {
        registry,
        source: expression,
    }
    .parse(expression)
}

struct Parser<'a> {
    registry: &'a KeywordRegistry,
    source: &'a str,
}

impl Parser<'_> {
    fn malformed(&self, reason: impl Into<String>) -> PredicateError {
        PredicateError::Malformed {
            expression: self.source.to_string(),
            reason: reason.into(),
        }
    }

    fn parse(&self, fragment: &str) -> Result<Predicate, PredicateError> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return Err(self.malformed("empty expression"));
        }

        if let Some((left, right)) = fragment.rsplit_once(',') {
            let left = self.parse(left)?;
            let right = self.parse(right)?;
            return Ok(left.or(right));
        }

        if let Some((left, right)) = fragment.rsplit_once('+') {
            let left = self.parse(left)?;
            let right = self.parse(right)?;
            return Ok(left.and(right));
        }

        if let Some(rest) = fragment.strip_prefix('!') {
            return Ok(self.parse(rest)?.negate());
        }

        self.parse_atom(fragment)
    }

    fn parse_atom(&self, atom: &str) -> Result<Predicate, PredicateError> {
        let Some((keyword, argument)) = atom.split_once(':') else {
            return Err(self.malformed(format!("missing ':' in '{}'", atom)));
        };

        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return Err(self.malformed(format!("missing keyword in '{}'", atom)));
        }
        if argument.is_empty() {
            return Err(self.malformed(format!("missing argument for '{}'", keyword)));
        }

        match self.registry.builder(&keyword) {
            Some(builder) => builder(argument),
            None => Err(self.malformed(format!("unknown keyword '{}'", keyword))),
        }
    }
}
