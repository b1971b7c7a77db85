//! Mock metadata resolver for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::metadata::{MetadataResolver, ResolutionError, ResolvedTitles};

/// Mock implementation of the MetadataResolver trait.
///
/// Unknown identifiers resolve to `ResolutionError::NotFound`.
///
/// # Example
///
/// ```rust,ignore
/// use fedsearch_core::testing::MockResolver;
///
/// let resolver = MockResolver::new();
/// resolver.add_titles("tt0111161", ResolvedTitles::new("The Shawshank Redemption")).await;
///
/// let titles = resolver.resolve_titles("tt0111161").await?;
/// assert_eq!(resolver.call_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockResolver {
    /// Titles by IMDb id.
    titles: Arc<RwLock<HashMap<String, ResolvedTitles>>>,
    /// Identifiers looked up, in order.
    lookups: Arc<RwLock<Vec<String>>>,
    /// If set, the next lookup will fail with this error.
    next_error: Arc<RwLock<Option<ResolutionError>>>,
    /// Simulated response time.
    delay: Arc<RwLock<Option<Duration>>>,
}

impl Default for MockResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockResolver {
    /// Create a resolver that knows no titles.
    pub fn new() -> Self {
        Self {
            titles: Arc::new(RwLock::new(HashMap::new())),
            lookups: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    /// Add titles for an IMDb id.
    pub async fn add_titles(&self, imdb_id: &str, titles: ResolvedTitles) {
        self.titles
            .write()
            .await
            .insert(imdb_id.to_string(), titles);
    }

    /// Configure the next lookup to fail with the given error.
    pub async fn set_next_error(&self, error: ResolutionError) {
        *self.next_error.write().await = Some(error);
    }

    /// Delay every lookup.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Get the number of lookups performed.
    pub async fn call_count(&self) -> usize {
        self.lookups.read().await.len()
    }

    /// Get the identifiers looked up.
    pub async fn recorded_lookups(&self) -> Vec<String> {
        self.lookups.read().await.clone()
    }
}

#[async_trait]
impl MetadataResolver for MockResolver {
    async fn resolve_titles(&self, imdb_id: &str) -> Result<ResolvedTitles, ResolutionError> {
        self.lookups.write().await.push(imdb_id.to_string());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        self.titles
            .read()
            .await
            .get(imdb_id)
            .cloned()
            .ok_or_else(|| ResolutionError::NotFound(imdb_id.to_string()))
    }
}
