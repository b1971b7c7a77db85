//! Fallback query derivation.
//!
//! When some active adapters cannot serve a request as-is (typically an
//! identifier-keyed movie search sent to adapters that only understand free
//! text), a fallback strategy derives broader text requests they can serve.

use std::sync::Arc;
use std::time::Duration;

use crate::adapter::SearchRequest;
use crate::metadata::{ResolutionError, TitleLookup};

/// A per-request fallback strategy.
#[derive(Debug)]
pub enum FallbackStrategy {
    /// Never derives anything.
    None,
    /// Derives one text request per title resolved for the IMDb id.
    ImdbTitle(ImdbTitleFallback),
}

impl FallbackStrategy {
    /// Derive fallback requests, waiting at most `budget` for the resolver.
    pub async fn fallback_queries(
        &self,
        budget: Duration,
    ) -> Result<Vec<SearchRequest>, ResolutionError> {
        match self {
            FallbackStrategy::None => Ok(Vec::new()),
            FallbackStrategy::ImdbTitle(strategy) => strategy.fallback_queries(budget).await,
        }
    }
}

/// Title-based fallback for IMDb-keyed requests.
#[derive(Debug)]
pub struct ImdbTitleFallback {
    request: SearchRequest,
    titles: Arc<TitleLookup>,
}

impl ImdbTitleFallback {
    pub fn new(request: SearchRequest, titles: Arc<TitleLookup>) -> Self {
        Self { request, titles }
    }

    async fn fallback_queries(
        &self,
        budget: Duration,
    ) -> Result<Vec<SearchRequest>, ResolutionError> {
        let titles = self.titles.resolve(budget).await?;
        Ok(titles
            .all()
            .into_iter()
            .map(|title| self.request.derive_with_term(title))
            .collect())
    }
}
