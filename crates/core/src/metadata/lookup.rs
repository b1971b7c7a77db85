//! Per-request memoized title resolution.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::{MetadataResolver, ResolutionError, ResolvedTitles};
use crate::metrics;

/// Resolves titles for one identifier at most once.
///
/// Created per aggregate call and shared (via `Arc`) between the fallback
/// strategy and the result filter of that call. The outcome is memoized,
/// failures included, so the resolver sees a single request.
pub struct TitleLookup {
    resolver: Arc<dyn MetadataResolver>,
    imdb_id: String,
    outcome: OnceCell<Result<Arc<ResolvedTitles>, ResolutionError>>,
}

impl TitleLookup {
    pub fn new(resolver: Arc<dyn MetadataResolver>, imdb_id: impl Into<String>) -> Self {
        Self {
            resolver,
            imdb_id: imdb_id.into(),
            outcome: OnceCell::new(),
        }
    }

    pub fn imdb_id(&self) -> &str {
        &self.imdb_id
    }

    /// Whether resolution already happened (successfully or not).
    pub fn is_resolved(&self) -> bool {
        self.outcome.initialized()
    }

    /// Resolve the titles, waiting at most `budget` if this is the first call.
    pub async fn resolve(&self, budget: Duration) -> Result<Arc<ResolvedTitles>, ResolutionError> {
        self.outcome
            .get_or_init(|| async {
                let start = Instant::now();
                let outcome =
                    match tokio::time::timeout(budget, self.resolver.resolve_titles(&self.imdb_id))
                        .await
                    {
                        Ok(result) => result.map(Arc::new),
                        Err(_) => Err(ResolutionError::Timeout),
                    };

                metrics::RESOLVER_DURATION.observe(start.elapsed().as_secs_f64());
                match &outcome {
                    Ok(titles) => {
                        metrics::RESOLVER_REQUESTS.with_label_values(&["success"]).inc();
                        debug!(
                            imdb_id = %self.imdb_id,
                            titles = titles.all().len(),
                            "Resolved titles"
                        );
                    }
                    Err(e) => {
                        metrics::RESOLVER_REQUESTS.with_label_values(&["error"]).inc();
                        warn!(imdb_id = %self.imdb_id, error = %e, "Title resolution failed");
                    }
                }
                outcome
            })
            .await
            .clone()
    }
}

impl fmt::Debug for TitleLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TitleLookup")
            .field("imdb_id", &self.imdb_id)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
