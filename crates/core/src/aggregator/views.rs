//! Named aggregate views.

use std::sync::Arc;

use tracing::{debug, info};

use crate::adapter::{AdapterHandle, SearchRequest};
use crate::config::{validate_config, Config, ConfigError};
use crate::metrics;
use crate::predicate::KeywordRegistry;
use crate::strategy::StrategyProvider;

use super::runner::{Aggregator, ALL_VIEW};
use super::types::{AggregateError, AggregateResult};

/// The `all` view plus the named views from configuration.
///
/// Every view is an [`Aggregator`] with its own inclusion predicate, sharing
/// the aggregator settings and strategy provider.
#[derive(Debug)]
pub struct AggregateViews {
    views: Vec<Aggregator>,
}

impl AggregateViews {
    /// Build all views, parsing every filter expression up front.
    ///
    /// Fails on the first invalid configuration or filter expression.
    pub fn from_config(
        config: &Config,
        registry: &KeywordRegistry,
        strategies: Arc<dyn StrategyProvider>,
    ) -> Result<Self, ConfigError> {
        validate_config(config)?;

        let mut all = Aggregator::from_config(&config.aggregator, Arc::clone(&strategies));
        if let Some(filter) = &config.aggregator.filter {
            let predicate = registry
                .parse(filter)
                .map_err(|source| ConfigError::InvalidFilter {
                    view: ALL_VIEW.to_string(),
                    source,
                })?;
            all = all.with_predicate(predicate);
        }

        let mut views = vec![all];
        for view in &config.views {
            let name = view.name.trim();
            let predicate = registry
                .parse(&view.filter)
                .map_err(|source| ConfigError::InvalidFilter {
                    view: name.to_string(),
                    source,
                })?;
            debug!(view = %name, filter = %view.filter, "Configured aggregate view");
            views.push(
                Aggregator::from_config(&config.aggregator, Arc::clone(&strategies))
                    .with_name(name)
                    .with_predicate(predicate),
            );
        }

        info!(
            views = views.len(),
            strategies = strategies.name(),
            "Aggregate views ready"
        );
        Ok(Self { views })
    }

    /// Look up a view by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&Aggregator> {
        let name = name.trim();
        self.views
            .iter()
            .find(|v| v.name().eq_ignore_ascii_case(name))
    }

    /// View names, `all` first, then in configuration order.
    pub fn names(&self) -> Vec<&str> {
        self.views.iter().map(|v| v.name()).collect()
    }

    /// Run an aggregate search on the named view.
    pub async fn aggregate(
        &self,
        view: &str,
        request: &SearchRequest,
        adapters: &[Arc<dyn AdapterHandle>],
    ) -> Result<AggregateResult, AggregateError> {
        match self.get(view) {
            Some(aggregator) => aggregator.aggregate(request, adapters).await,
            None => {
                metrics::AGGREGATES_TOTAL
                    .with_label_values(&[view, "unknown_view"])
                    .inc();
                Err(AggregateError::UnknownView(view.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterMetadata;
    use crate::config::{load_config_from_str, AggregatorConfig, ViewConfig};
    use crate::predicate::PredicateError;
    use crate::strategy::DisabledStrategies;
    use crate::testing::{fixtures, MockAdapter};

    fn build(config: &Config) -> Result<AggregateViews, ConfigError> {
        AggregateViews::from_config(
            config,
            &KeywordRegistry::with_defaults(),
            Arc::new(DisabledStrategies),
        )
    }

    #[test]
    fn test_views_from_config() {
        let config = load_config_from_str(
            r#"
[aggregator]
deadline_ms = 1000

[[views]]
name = "english"
filter = "lang:en"

[[views]]
name = "private"
filter = "type:private"
"#,
        )
        .unwrap();

        let views = build(&config).unwrap();
        assert_eq!(views.names(), vec!["all", "english", "private"]);
        assert!(views.get("ENGLISH").is_some());
        assert!(views.get("missing").is_none());
    }

    #[test]
    fn test_invalid_filter_names_the_view() {
        let config = Config {
            aggregator: AggregatorConfig::default(),
            views: vec![ViewConfig {
                name: "broken".to_string(),
                filter: "colour:red".to_string(),
            }],
        };

        match build(&config) {
            Err(ConfigError::InvalidFilter { view, source }) => {
                assert_eq!(view, "broken");
                assert!(matches!(source, PredicateError::Malformed { .. }));
                assert!(source.to_string().contains("unknown keyword 'colour'"));
            }
            other => panic!("expected InvalidFilter, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_all_filter() {
        let config = Config {
            aggregator: AggregatorConfig {
                filter: Some("type:secret".to_string()),
                ..AggregatorConfig::default()
            },
            views: vec![],
        };
        assert!(matches!(
            build(&config),
            Err(ConfigError::InvalidFilter { view, .. }) if view == "all"
        ));
    }

    #[tokio::test]
    async fn test_aggregate_on_view() {
        let config = Config {
            aggregator: AggregatorConfig::default(),
            views: vec![ViewConfig {
                name: "private".to_string(),
                filter: "type:private".to_string(),
            }],
        };
        let views = build(&config).unwrap();

        let mut private = AdapterMetadata::new("private-one");
        private.kind = crate::adapter::AdapterKind::Private;
        let private = Arc::new(MockAdapter::with_metadata(private));
        private
            .set_results(vec![fixtures::release("P", "p", 1.0)])
            .await;
        let public = Arc::new(MockAdapter::new("public-one"));
        public
            .set_results(vec![fixtures::release("Q", "q", 2.0)])
            .await;
        let adapters: Vec<Arc<dyn AdapterHandle>> = vec![private, public];

        let request = SearchRequest::text("x");
        let result = views.aggregate("private", &request, &adapters).await.unwrap();
        assert_eq!(result.view, "private");
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].title, "P");

        let result = views.aggregate("all", &request, &adapters).await.unwrap();
        assert_eq!(result.records.len(), 2);

        let err = views.aggregate("nope", &request, &adapters).await.unwrap_err();
        assert_eq!(err, AggregateError::UnknownView("nope".to_string()));
    }
}
