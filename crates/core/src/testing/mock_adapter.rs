//! Mock adapter for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::adapter::{AdapterError, AdapterHandle, AdapterMetadata, ReleaseRecord, SearchRequest};

/// A recorded query for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedQuery {
    /// The request the adapter received.
    pub request: SearchRequest,
    /// When the query was made.
    pub timestamp: Instant,
}

/// A query handler that produces results dynamically based on the request.
type QueryHandler = Box<dyn Fn(&SearchRequest) -> Option<Vec<ReleaseRecord>> + Send + Sync>;

/// Mock implementation of the AdapterHandle trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable records
/// - Track queries for assertions
/// - Simulate failures, slow responses and adapters that never respond
///
/// # Example
///
/// ```rust,ignore
/// use fedsearch_core::testing::{MockAdapter, fixtures};
///
/// let adapter = MockAdapter::new("public-1");
/// adapter.set_results(vec![
///     fixtures::release("Ubuntu 24.04 LTS", "magnet:?xt=urn:btih:abc", 12.0),
/// ]).await;
///
/// let records = adapter.query(&SearchRequest::text("ubuntu")).await?;
/// assert_eq!(records.len(), 1);
/// assert_eq!(adapter.query_count().await, 1);
/// ```
pub struct MockAdapter {
    metadata: AdapterMetadata,
    /// Only handles requests without an IMDb id.
    text_only: bool,
    /// Configured records to return.
    results: Arc<RwLock<Vec<ReleaseRecord>>>,
    /// Recorded queries.
    queries: Arc<RwLock<Vec<RecordedQuery>>>,
    /// If set, the next query will fail with this error.
    next_error: Arc<RwLock<Option<AdapterError>>>,
    /// If set, every query fails with this error.
    failure: Arc<RwLock<Option<AdapterError>>>,
    /// Simulated response time.
    delay: Arc<RwLock<Option<Duration>>>,
    /// Never respond.
    hang: Arc<RwLock<bool>>,
    /// Query handler for dynamic results based on the request.
    query_handler: Arc<RwLock<Option<QueryHandler>>>,
}

impl std::fmt::Debug for MockAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockAdapter")
            .field("metadata", &self.metadata)
            .field("text_only", &self.text_only)
            .field("results", &"<results>")
            .field("queries", &"<queries>")
            .field("query_handler", &"<handler>")
            .finish()
    }
}

impl MockAdapter {
    /// Create a configured, healthy, public en-US adapter with no results.
    pub fn new(id: &str) -> Self {
        Self::with_metadata(AdapterMetadata::new(id))
    }

    /// Create a mock adapter with the given metadata.
    pub fn with_metadata(metadata: AdapterMetadata) -> Self {
        Self {
            metadata,
            text_only: false,
            results: Arc::new(RwLock::new(Vec::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            failure: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
            hang: Arc::new(RwLock::new(false)),
            query_handler: Arc::new(RwLock::new(None)),
        }
    }

    /// Refuse requests that carry an IMDb id, like a free-text-only indexer.
    pub fn text_only(mut self) -> Self {
        self.text_only = true;
        self
    }

    /// Set the records to return for subsequent queries.
    pub async fn set_results(&self, results: Vec<ReleaseRecord>) {
        *self.results.write().await = results;
    }

    /// Add a single record.
    pub async fn add_result(&self, result: ReleaseRecord) {
        self.results.write().await.push(result);
    }

    /// Get recorded requests, in the order they were received.
    pub async fn recorded_queries(&self) -> Vec<SearchRequest> {
        self.queries
            .read()
            .await
            .iter()
            .map(|q| q.request.clone())
            .collect()
    }

    /// Get the number of queries received.
    pub async fn query_count(&self) -> usize {
        self.queries.read().await.len()
    }

    /// Configure the next query to fail with the given error.
    pub async fn set_next_error(&self, error: AdapterError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every query fail with the given error.
    pub async fn set_failure(&self, error: AdapterError) {
        *self.failure.write().await = Some(error);
    }

    /// Delay every response.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Never respond to queries.
    pub async fn hang(&self) {
        *self.hang.write().await = true;
    }

    /// Set a query handler that produces records based on the request.
    ///
    /// The handler returns `Some(records)` to override the configured
    /// results, or `None` to fall through to them.
    pub async fn set_query_handler<F>(&self, handler: F)
    where
        F: Fn(&SearchRequest) -> Option<Vec<ReleaseRecord>> + Send + Sync + 'static,
    {
        *self.query_handler.write().await = Some(Box::new(handler));
    }
}

#[async_trait]
impl AdapterHandle for MockAdapter {
    fn metadata(&self) -> AdapterMetadata {
        self.metadata.clone()
    }

    fn can_handle(&self, request: &SearchRequest) -> bool {
        !(self.text_only && request.imdb_id().is_some())
    }

    async fn query(&self, request: &SearchRequest) -> Result<Vec<ReleaseRecord>, AdapterError> {
        // Record the query
        self.queries.write().await.push(RecordedQuery {
            request: request.clone(),
            timestamp: Instant::now(),
        });

        if *self.hang.read().await {
            std::future::pending::<()>().await;
        }
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        // Check for injected errors
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if let Some(err) = self.failure.read().await.clone() {
            return Err(err);
        }

        let handler = self.query_handler.read().await;
        if let Some(ref h) = *handler {
            if let Some(records) = h(request) {
                return Ok(records);
            }
        }
        drop(handler);

        Ok(self.results.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_returns_results_and_records_queries() {
        let adapter = MockAdapter::new("mock");
        adapter
            .set_results(vec![fixtures::release("A", "a", 1.0)])
            .await;

        let records = adapter.query(&SearchRequest::text("a")).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(adapter.query_count().await, 1);
        assert_eq!(adapter.recorded_queries().await[0].term, "a");
    }

    #[tokio::test]
    async fn test_next_error_is_one_shot() {
        let adapter = MockAdapter::new("mock");
        adapter
            .set_next_error(AdapterError::Upstream("HTTP 500".to_string()))
            .await;

        assert!(adapter.query(&SearchRequest::text("a")).await.is_err());
        assert!(adapter.query(&SearchRequest::text("a")).await.is_ok());
    }

    #[tokio::test]
    async fn test_query_handler() {
        let adapter = MockAdapter::new("mock");
        adapter
            .set_query_handler(|request| {
                (request.term == "special").then(|| vec![fixtures::release("S", "s", 1.0)])
            })
            .await;

        assert_eq!(adapter.query(&SearchRequest::text("special")).await.unwrap().len(), 1);
        assert!(adapter.query(&SearchRequest::text("other")).await.unwrap().is_empty());
    }

    #[test]
    fn test_text_only() {
        let adapter = MockAdapter::new("mock").text_only();
        assert!(adapter.can_handle(&SearchRequest::text("a")));
        assert!(!adapter.can_handle(&SearchRequest::imdb("tt0111161")));
    }

    #[test]
    fn test_hang_stays_pending() {
        let adapter = MockAdapter::new("mock");
        tokio_test::block_on(adapter.hang());

        let request = SearchRequest::text("a");
        let mut query = tokio_test::task::spawn(adapter.query(&request));
        tokio_test::assert_pending!(query.poll());
        tokio_test::assert_pending!(query.poll());
        drop(query);

        assert_eq!(tokio_test::block_on(adapter.query_count()), 1);
    }
}
