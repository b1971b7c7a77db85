//! Built-in predicate keywords.

use std::sync::Arc;

use crate::adapter::{AdapterHealth, AdapterKind, TestOutcome};

use super::{KeywordBuilder, Predicate, PredicateError};

const KINDS: &[&str] = &["public", "semi-private", "private"];
const HEALTH: &[&str] = &["healthy", "failing", "unknown"];
const TEST_OUTCOMES: &[&str] = &["passed", "failed"];

pub(super) fn builtin() -> Vec<(&'static str, KeywordBuilder)> {
    vec![
        ("group", Arc::new(group) as KeywordBuilder),
        ("lang", Arc::new(lang) as KeywordBuilder),
        ("type", Arc::new(kind) as KeywordBuilder),
        ("status", Arc::new(status) as KeywordBuilder),
        ("test", Arc::new(last_test) as KeywordBuilder),
    ]
}

/// `group:<name>` - adapter carries the group tag (case-insensitive).
fn group(argument: &str) -> Result<Predicate, PredicateError> {
    let wanted = argument.to_lowercase();
    Ok(Predicate::new(move |a| {
        a.groups.iter().any(|g| g.to_lowercase() == wanted)
    }))
}

/// `lang:<prefix>` - adapter language starts with the prefix (case-insensitive).
fn lang(argument: &str) -> Result<Predicate, PredicateError> {
    let prefix = argument.to_lowercase();
    Ok(Predicate::new(move |a| {
        a.language.to_lowercase().starts_with(&prefix)
    }))
}

/// `type:<public|semi-private|private>`
fn kind(argument: &str) -> Result<Predicate, PredicateError> {
    let wanted = match argument.to_lowercase().as_str() {
        "public" => AdapterKind::Public,
        "semi-private" => AdapterKind::SemiPrivate,
        "private" => AdapterKind::Private,
        _ => return Err(PredicateError::invalid_argument("type", argument, KINDS)),
    };
    Ok(Predicate::new(move |a| a.kind == wanted))
}

/// `status:<healthy|failing|unknown>`
fn status(argument: &str) -> Result<Predicate, PredicateError> {
    let wanted = match argument.to_lowercase().as_str() {
        "healthy" => AdapterHealth::Healthy,
        "failing" => AdapterHealth::Failing,
        "unknown" => AdapterHealth::Unknown,
        _ => return Err(PredicateError::invalid_argument("status", argument, HEALTH)),
    };
    Ok(Predicate::new(move |a| a.health == wanted))
}

/// `test:<passed|failed>` - outcome of the last self-test; untested adapters
/// match neither.
fn last_test(argument: &str) -> Result<Predicate, PredicateError> {
    let wanted = match argument.to_lowercase().as_str() {
        "passed" => TestOutcome::Passed,
        "failed" => TestOutcome::Failed,
        _ => {
            return Err(PredicateError::invalid_argument(
                "test",
                argument,
                TEST_OUTCOMES,
            ))
        }
    };
    Ok(Predicate::new(move |a| a.last_test == Some(wanted)))
}

#[cfg(test)]
mod tests {
    use crate::adapter::{AdapterHealth, AdapterKind, AdapterMetadata, TestOutcome};
    use crate::predicate::{KeywordRegistry, PredicateError};

    fn adapter(
        id: &str,
        language: &str,
        kind: AdapterKind,
        groups: &[&str],
        health: AdapterHealth,
        last_test: Option<TestOutcome>,
    ) -> AdapterMetadata {
        AdapterMetadata {
            id: id.to_string(),
            configured: true,
            language: language.to_string(),
            kind,
            groups: groups.iter().map(|g| g.to_string()).collect(),
            health,
            last_test,
        }
    }

    fn fixtures() -> Vec<AdapterMetadata> {
        vec![
            adapter(
                "alpha",
                "en-US",
                AdapterKind::Public,
                &["Scene", "movies"],
                AdapterHealth::Healthy,
                Some(TestOutcome::Passed),
            ),
            adapter(
                "beta",
                "fr-FR",
                AdapterKind::Private,
                &["tv"],
                AdapterHealth::Failing,
                Some(TestOutcome::Failed),
            ),
            adapter(
                "gamma",
                "en-GB",
                AdapterKind::SemiPrivate,
                &[],
                AdapterHealth::Unknown,
                None,
            ),
        ]
    }

    fn matching(expression: &str) -> Vec<String> {
        let predicate = KeywordRegistry::with_defaults().parse(expression).unwrap();
        fixtures()
            .into_iter()
            .filter(|a| predicate.matches(a))
            .map(|a| a.id)
            .collect()
    }

    #[test]
    fn test_group_membership_is_case_insensitive() {
        assert_eq!(matching("group:scene"), vec!["alpha"]);
        assert_eq!(matching("group:MOVIES"), vec!["alpha"]);
        assert!(matching("group:anime").is_empty());
    }

    #[test]
    fn test_lang_prefix() {
        assert_eq!(matching("lang:en"), vec!["alpha", "gamma"]);
        assert_eq!(matching("lang:en-us"), vec!["alpha"]);
        assert_eq!(matching("lang:FR"), vec!["beta"]);
    }

    #[test]
    fn test_type_exact() {
        assert_eq!(matching("type:public"), vec!["alpha"]);
        assert_eq!(matching("type:Semi-Private"), vec!["gamma"]);
        assert_eq!(matching("type:private"), vec!["beta"]);
    }

    #[test]
    fn test_status() {
        assert_eq!(matching("status:healthy"), vec!["alpha"]);
        assert_eq!(matching("status:failing"), vec!["beta"]);
        assert_eq!(matching("status:unknown"), vec!["gamma"]);
    }

    #[test]
    fn test_test_outcome() {
        assert_eq!(matching("test:passed"), vec!["alpha"]);
        assert_eq!(matching("test:failed"), vec!["beta"]);
        // Untested adapters match neither outcome
        assert_eq!(matching("!test:passed+!test:failed"), vec!["gamma"]);
    }

    #[test]
    fn test_negated_status_is_complement() {
        let registry = KeywordRegistry::with_defaults();
        let positive = registry.parse("status:healthy").unwrap();
        let negative = registry.parse("!status:healthy").unwrap();
        for a in fixtures() {
            assert_eq!(negative.matches(&a), !positive.matches(&a), "{}", a.id);
        }
    }

    #[test]
    fn test_combined_expression() {
        assert_eq!(matching("lang:en+!type:public,group:tv"), vec!["beta", "gamma"]);
    }

    #[test]
    fn test_invalid_arguments_name_expected_values() {
        let registry = KeywordRegistry::with_defaults();

        let err = registry.parse("status:sick").unwrap_err();
        assert_eq!(
            err,
            PredicateError::InvalidArgument {
                keyword: "status".to_string(),
                argument: "sick".to_string(),
                expected: "healthy|failing|unknown".to_string(),
            }
        );

        let err = registry.parse("type:secret").unwrap_err();
        assert!(err.to_string().contains("public|semi-private|private"));

        let err = registry.parse("test:skipped").unwrap_err();
        assert!(err.to_string().contains("passed|failed"));
    }
}
