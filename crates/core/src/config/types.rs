use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    /// Named views, each aggregating a filtered subset of adapters
    #[serde(default)]
    pub views: Vec<ViewConfig>,
}

/// Aggregation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AggregatorConfig {
    /// Joint deadline for all adapter queries of one call, in milliseconds (default: 40000)
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
    /// Upper bound for title resolution, in milliseconds (default: 10000); the deadline still applies
    #[serde(default = "default_resolver_timeout_ms")]
    pub resolver_timeout_ms: u64,
    /// Fail instead of returning an empty result when no adapter is selected
    #[serde(default)]
    pub require_adapters: bool,
    /// Derive title queries for adapters that can't search by IMDb id (default: true)
    #[serde(default = "default_true")]
    pub fallback: bool,
    /// Drop results that belong to a different movie (default: true)
    #[serde(default = "default_true")]
    pub filter_results: bool,
    /// Inclusion predicate for the "all" view (e.g., "!status:failing")
    #[serde(default)]
    pub filter: Option<String>,
}

impl AggregatorConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn resolver_timeout(&self) -> Duration {
        Duration::from_millis(self.resolver_timeout_ms)
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            deadline_ms: default_deadline_ms(),
            resolver_timeout_ms: default_resolver_timeout_ms(),
            require_adapters: false,
            fallback: true,
            filter_results: true,
            filter: None,
        }
    }
}

fn default_deadline_ms() -> u64 {
    40_000
}

fn default_resolver_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

/// A named aggregate view
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ViewConfig {
    pub name: String,
    /// Predicate expression selecting the view's adapters (e.g., "lang:en+type:public")
    pub filter: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregator_defaults() {
        let config = AggregatorConfig::default();
        assert_eq!(config.deadline(), Duration::from_secs(40));
        assert_eq!(config.resolver_timeout(), Duration::from_secs(10));
        assert!(!config.require_adapters);
        assert!(config.fallback);
        assert!(config.filter_results);
        assert!(config.filter.is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.aggregator.deadline_ms, 40_000);
        assert!(config.views.is_empty());
    }
}
