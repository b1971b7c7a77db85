//! Keyword registry for predicate expressions.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{keywords, parser, Predicate, PredicateError};

/// Builds a predicate from a keyword's argument, validating it.
pub type KeywordBuilder = Arc<dyn Fn(&str) -> Result<Predicate, PredicateError> + Send + Sync>;

/// Explicit mapping from lowercase keyword to predicate builder.
///
/// Assembled once at startup by the configuration layer, then used read-only
/// to parse expressions.
#[derive(Clone, Default)]
pub struct KeywordRegistry {
    builders: HashMap<String, KeywordBuilder>,
}

impl KeywordRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in keywords
    /// (`group`, `lang`, `type`, `status`, `test`).
    pub fn with_defaults() -> Self {
        let builders = keywords::builtin()
            .into_iter()
            .map(|(name, builder)| (name.to_string(), builder))
            .collect();
        Self { builders }
    }

    /// Register a keyword builder.
    ///
    /// Keyword names are case-insensitive and may not contain operator
    /// characters. Registering the same keyword twice is an error.
    pub fn register<F>(&mut self, name: &str, builder: F) -> Result<(), PredicateError>
    where
        F: Fn(&str) -> Result<Predicate, PredicateError> + Send + Sync + 'static,
    {
        let key = name.trim().to_lowercase();
        if key.is_empty() || key.contains([':', ',', '+', '!']) || key.contains(char::is_whitespace)
        {
            return Err(PredicateError::InvalidKeyword(name.to_string()));
        }
        if self.builders.contains_key(&key) {
            return Err(PredicateError::DuplicateKeyword(key));
        }
        self.builders.insert(key, Arc::new(builder));
        Ok(())
    }

    /// Registered keyword names, sorted.
    pub fn keywords(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Parse an expression into a predicate.
    pub fn parse(&self, expression: &str) -> Result<Predicate, PredicateError> {
        parser::parse_expression(self, expression)
    }

    pub(crate) fn builder(&self, keyword: &str) -> Option<&KeywordBuilder> {
        self.builders.get(keyword)
    }
}

impl fmt::Debug for KeywordRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordRegistry")
            .field("keywords", &self.keywords())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_registered() {
        let registry = KeywordRegistry::with_defaults();
        assert_eq!(
            registry.keywords(),
            vec!["group", "lang", "status", "test", "type"]
        );
    }

    #[test]
    fn test_register_duplicate_fails() {
        let mut registry = KeywordRegistry::with_defaults();
        let result = registry.register("Status", |_| Ok(Predicate::constant(true)));
        assert_eq!(
            result.unwrap_err(),
            PredicateError::DuplicateKeyword("status".to_string())
        );
    }

    #[test]
    fn test_register_custom_keyword() {
        let mut registry = KeywordRegistry::new();
        registry
            .register("ID", |arg| {
                let wanted = arg.to_string();
                Ok(Predicate::new(move |a| a.id == wanted))
            })
            .unwrap();

        let predicate = registry.parse("id:alpha").unwrap();
        assert!(predicate.matches(&crate::adapter::AdapterMetadata::new("alpha")));
        assert!(!predicate.matches(&crate::adapter::AdapterMetadata::new("beta")));
    }

    #[test]
    fn test_register_rejects_operator_characters() {
        let mut registry = KeywordRegistry::new();
        for name in ["", "a:b", "a,b", "a+b", "!a", "a b"] {
            let result = registry.register(name, |_| Ok(Predicate::constant(true)));
            assert!(
                matches!(result, Err(PredicateError::InvalidKeyword(_))),
                "expected rejection for {:?}",
                name
            );
        }
    }
}
