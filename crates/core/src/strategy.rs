//! Selection of the fallback and filter strategies for a request.

use std::sync::Arc;

use tracing::warn;

use crate::adapter::SearchRequest;
use crate::config::AggregatorConfig;
use crate::fallback::{FallbackStrategy, ImdbTitleFallback};
use crate::filter::{ImdbTitleFilter, ResultFilter};
use crate::metadata::{MetadataResolver, TitleLookup};

/// Strategies scoped to exactly one request.
///
/// Never shared across aggregate calls: the strategies memoize resolver
/// results for their request.
#[derive(Debug)]
pub struct RequestStrategies {
    pub fallbacks: Vec<FallbackStrategy>,
    pub filter: ResultFilter,
}

impl RequestStrategies {
    /// No fallback, no filtering.
    pub fn none() -> Self {
        Self {
            fallbacks: Vec::new(),
            filter: ResultFilter::NoOp,
        }
    }
}

/// Maps a request to the strategies that apply to it.
pub trait StrategyProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Build fresh strategies for one request.
    fn strategies_for(&self, request: &SearchRequest) -> RequestStrategies;
}

/// Provider that never falls back or filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledStrategies;

impl StrategyProvider for DisabledStrategies {
    fn name(&self) -> &str {
        "disabled"
    }

    fn strategies_for(&self, _request: &SearchRequest) -> RequestStrategies {
        RequestStrategies::none()
    }
}

/// Provider for IMDb-keyed requests.
///
/// Requests carrying an IMDb id get title fallback and title filtering, both
/// backed by one shared [`TitleLookup`]. Everything else gets nothing.
pub struct ImdbStrategyProvider {
    resolver: Arc<dyn MetadataResolver>,
    fallback: bool,
    filter: bool,
}

impl ImdbStrategyProvider {
    pub fn new(resolver: Arc<dyn MetadataResolver>) -> Self {
        Self {
            resolver,
            fallback: true,
            filter: true,
        }
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback = enabled;
        self
    }

    pub fn with_filter(mut self, enabled: bool) -> Self {
        self.filter = enabled;
        self
    }
}

impl StrategyProvider for ImdbStrategyProvider {
    fn name(&self) -> &str {
        "imdb"
    }

    fn strategies_for(&self, request: &SearchRequest) -> RequestStrategies {
        let Some(imdb_id) = request.imdb_id() else {
            return RequestStrategies::none();
        };

        let lookup = Arc::new(TitleLookup::new(Arc::clone(&self.resolver), imdb_id));

        let fallbacks = if self.fallback {
            vec![FallbackStrategy::ImdbTitle(ImdbTitleFallback::new(
                request.clone(),
                Arc::clone(&lookup),
            ))]
        } else {
            Vec::new()
        };

        let filter = if self.filter {
            ResultFilter::ImdbTitle(ImdbTitleFilter::new(request.clone(), lookup))
        } else {
            ResultFilter::NoOp
        };

        RequestStrategies { fallbacks, filter }
    }
}

/// Factory function to create a strategy provider from config
///
/// Without a resolver there is nothing to resolve titles with, so the
/// strategies are disabled regardless of the toggles.
pub fn create_strategy_provider(
    config: &AggregatorConfig,
    resolver: Option<Arc<dyn MetadataResolver>>,
) -> Arc<dyn StrategyProvider> {
    if !config.fallback && !config.filter_results {
        return Arc::new(DisabledStrategies);
    }
    match resolver {
        Some(resolver) => Arc::new(
            ImdbStrategyProvider::new(resolver)
                .with_fallback(config.fallback)
                .with_filter(config.filter_results),
        ),
        None => {
            warn!("No metadata resolver configured, IMDb fallback and filtering disabled");
            Arc::new(DisabledStrategies)
        }
    }
}
