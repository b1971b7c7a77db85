//! The aggregation orchestrator.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::{Id, JoinSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adapter::{AdapterError, AdapterHandle, AdapterMetadata, ReleaseRecord, SearchRequest};
use crate::config::AggregatorConfig;
use crate::metrics;
use crate::predicate::Predicate;
use crate::strategy::StrategyProvider;

use super::ranking::{deduplicate, paginate, rank};
use super::types::{
    AdapterReport, AdapterStatus, AggregateError, AggregateNotice, AggregateResult,
};

/// Name of the default view covering every configured adapter.
pub const ALL_VIEW: &str = "all";

type OperationOutput = (usize, Result<Vec<ReleaseRecord>, AdapterError>);

/// One launched query: which adapter, and how it ended.
struct Slot {
    adapter: usize,
    fallback: bool,
    outcome: Option<Result<Vec<ReleaseRecord>, String>>,
}

/// Fans a request out to a set of adapters and merges the results.
///
/// Holds only configuration; every call builds its own strategies and task
/// set, so one aggregator can serve concurrent calls.
pub struct Aggregator {
    name: String,
    predicate: Option<Predicate>,
    strategies: Arc<dyn StrategyProvider>,
    deadline: Duration,
    resolver_timeout: Duration,
    require_adapters: bool,
}

impl Aggregator {
    /// Create an aggregator for the `all` view with default settings.
    pub fn new(strategies: Arc<dyn StrategyProvider>) -> Self {
        Self::from_config(&AggregatorConfig::default(), strategies)
    }

    /// Create an aggregator from configuration.
    ///
    /// The config's filter expression is not parsed here; see
    /// [`AggregateViews`](super::AggregateViews).
    pub fn from_config(config: &AggregatorConfig, strategies: Arc<dyn StrategyProvider>) -> Self {
        Self {
            name: ALL_VIEW.to_string(),
            predicate: None,
            strategies,
            deadline: config.deadline(),
            resolver_timeout: config.resolver_timeout(),
            require_adapters: config.require_adapters,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Only adapters matching `predicate` take part.
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Joint deadline for all operations of one call.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Upper bound for title resolution. The joint deadline bounds it further.
    pub fn with_resolver_timeout(mut self, timeout: Duration) -> Self {
        self.resolver_timeout = timeout;
        self
    }

    /// Fail with `NoAdaptersConfigured` instead of returning an empty result.
    pub fn with_require_adapters(mut self, require: bool) -> Self {
        self.require_adapters = require;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// The configured adapters this view selects.
    pub fn active_adapters(&self, adapters: &[Arc<dyn AdapterHandle>]) -> Vec<Arc<dyn AdapterHandle>> {
        adapters
            .iter()
            .filter(|a| self.selects(&a.metadata()))
            .cloned()
            .collect()
    }

    fn selects(&self, metadata: &AdapterMetadata) -> bool {
        metadata.configured
            && self
                .predicate
                .as_ref()
                .map(|p| p.matches(metadata))
                .unwrap_or(true)
    }

    /// Run one aggregate search.
    ///
    /// Only fails when no adapter is selected and the aggregator requires
    /// one. Adapter errors, timeouts and resolver failures degrade the
    /// result and are reported in it.
    pub async fn aggregate(
        &self,
        request: &SearchRequest,
        adapters: &[Arc<dyn AdapterHandle>],
    ) -> Result<AggregateResult, AggregateError> {
        let id = Uuid::new_v4();
        let start = Instant::now();

        let mut reports: Vec<AdapterReport> = Vec::with_capacity(adapters.len());
        let mut active: Vec<usize> = Vec::new();
        for (index, adapter) in adapters.iter().enumerate() {
            let metadata = adapter.metadata();
            if self.selects(&metadata) {
                active.push(index);
            }
            reports.push(AdapterReport::not_attempted(metadata.id));
        }

        if active.is_empty() {
            if self.require_adapters {
                metrics::AGGREGATES_TOTAL
                    .with_label_values(&[self.name.as_str(), "no_adapters"])
                    .inc();
                warn!(aggregate_id = %id, view = %self.name, "No adapters selected");
                return Err(AggregateError::NoAdaptersConfigured(self.name.clone()));
            }
            debug!(aggregate_id = %id, view = %self.name, "No adapters selected, empty result");
        }

        let strategies = self.strategies.strategies_for(request);
        let mut notices = Vec::new();
        let mut slots: Vec<Slot> = Vec::new();
        let mut tasks: JoinSet<OperationOutput> = JoinSet::new();
        let mut task_slots: HashMap<Id, usize> = HashMap::new();

        // Primary dispatch
        let dispatch_start = tokio::time::Instant::now();
        let deadline = dispatch_start + self.deadline;
        let mut unable: Vec<usize> = Vec::new();
        for &index in &active {
            if adapters[index].can_handle(request) {
                launch(
                    &mut tasks,
                    &mut task_slots,
                    &mut slots,
                    index,
                    Arc::clone(&adapters[index]),
                    request.clone(),
                    false,
                );
            } else {
                unable.push(index);
            }
        }

        // Title resolution overlaps the queries and ends by the deadline
        let prefetch = strategies
            .filter
            .prefetch(self.resolver_timeout.min(self.deadline));

        // Fallback dispatch, only for adapters that can't serve the original
        if !unable.is_empty() {
            for strategy in &strategies.fallbacks {
                let budget = deadline
                    .saturating_duration_since(tokio::time::Instant::now())
                    .min(self.resolver_timeout);
                match strategy.fallback_queries(budget).await {
                    Ok(derived) => {
                        for derived_request in derived {
                            for &index in &unable {
                                if adapters[index].can_handle(&derived_request) {
                                    launch(
                                        &mut tasks,
                                        &mut task_slots,
                                        &mut slots,
                                        index,
                                        Arc::clone(&adapters[index]),
                                        derived_request.clone(),
                                        true,
                                    );
                                }
                            }
                        }
                    }
                    Err(e) => {
                        warn!(aggregate_id = %id, error = %e, "Fallback unavailable");
                        notices.push(AggregateNotice::FallbackUnavailable {
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        let fallback_queries = slots.iter().filter(|s| s.fallback).count();
        metrics::FALLBACK_QUERIES.inc_by(fallback_queries as u64);
        debug!(
            aggregate_id = %id,
            view = %self.name,
            operations = slots.len(),
            fallback_queries,
            "Dispatched aggregate search"
        );

        // Joint deadline
        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next_with_id()).await {
                Ok(Some(Ok((task_id, (slot, result))))) => {
                    task_slots.remove(&task_id);
                    slots[slot].outcome = Some(result.map_err(|e| e.to_string()));
                }
                Ok(Some(Err(join_error))) => {
                    if let Some(slot) = task_slots.remove(&join_error.id()) {
                        slots[slot].outcome = Some(Err(format!("Adapter task failed: {}", join_error)));
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    debug!(
                        aggregate_id = %id,
                        outstanding = tasks.len(),
                        "Deadline reached, abandoning outstanding operations"
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        // Merge in launch order
        let mut merged: Vec<ReleaseRecord> = Vec::new();
        for slot in slots {
            let report = &mut reports[slot.adapter];
            report.operations += 1;
            let (status, error) = match slot.outcome {
                Some(Ok(records)) => {
                    report.count += records.len();
                    merged.extend(records);
                    (AdapterStatus::Ok, None)
                }
                Some(Err(e)) => {
                    warn!(aggregate_id = %id, adapter = %report.adapter, error = %e, "Adapter query failed");
                    (AdapterStatus::Error, Some(e))
                }
                None => {
                    warn!(aggregate_id = %id, adapter = %report.adapter, "Adapter query timed out");
                    (
                        AdapterStatus::Timeout,
                        Some(format!("No response within {} ms", self.deadline.as_millis())),
                    )
                }
            };
            metrics::ADAPTER_QUERIES
                .with_label_values(&[report.adapter.as_str(), status.as_str()])
                .inc();
            fold_status(report, status, error);
        }

        // Filter against the original request
        let budget = deadline
            .saturating_duration_since(tokio::time::Instant::now())
            .min(self.resolver_timeout);
        let filtered = strategies.filter.filter_results(merged, budget).await;
        if let Some(handle) = prefetch {
            handle.abort();
        }
        if let Some(e) = filtered.degraded {
            notices.push(AggregateNotice::FilterDegraded {
                reason: e.to_string(),
            });
        }
        metrics::RECORDS_FILTERED.inc_by(filtered.removed as u64);

        let mut records = deduplicate(filtered.records);
        rank(&mut records);
        let records = paginate(records, request.offset, request.limit);

        let duration = start.elapsed();
        metrics::AGGREGATES_TOTAL
            .with_label_values(&[self.name.as_str(), "ok"])
            .inc();
        metrics::AGGREGATE_DURATION
            .with_label_values(&[self.name.as_str()])
            .observe(duration.as_secs_f64());
        metrics::AGGREGATE_RESULTS.observe(records.len() as f64);

        info!(
            aggregate_id = %id,
            view = %self.name,
            results = records.len(),
            filtered_out = filtered.removed,
            duration_ms = duration.as_millis() as u64,
            "Aggregate search complete"
        );

        Ok(AggregateResult {
            id,
            view: self.name.clone(),
            records,
            adapters: reports,
            notices,
            fallback_queries,
            filtered_out: filtered.removed,
            duration_ms: duration.as_millis() as u64,
        })
    }
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator")
            .field("name", &self.name)
            .field("filtered", &self.predicate.is_some())
            .field("strategies", &self.strategies.name())
            .field("deadline", &self.deadline)
            .field("resolver_timeout", &self.resolver_timeout)
            .field("require_adapters", &self.require_adapters)
            .finish()
    }
}

/// Start one query on its own request clone, recording its slot.
fn launch(
    tasks: &mut JoinSet<OperationOutput>,
    task_slots: &mut HashMap<Id, usize>,
    slots: &mut Vec<Slot>,
    adapter_index: usize,
    adapter: Arc<dyn AdapterHandle>,
    request: SearchRequest,
    fallback: bool,
) {
    let slot = slots.len();
    slots.push(Slot {
        adapter: adapter_index,
        fallback,
        outcome: None,
    });
    let handle = tasks.spawn(async move {
        let result = adapter.query(&request).await;
        (slot, result)
    });
    task_slots.insert(handle.id(), slot);
}

/// Combine one operation's outcome into the adapter's report.
///
/// The first error or timeout sticks; `Ok` only upgrades `NotAttempted`.
fn fold_status(report: &mut AdapterReport, status: AdapterStatus, error: Option<String>) {
    match (report.status, status) {
        (AdapterStatus::NotAttempted, _) | (AdapterStatus::Ok, AdapterStatus::Error | AdapterStatus::Timeout) => {
            report.status = status;
            report.error = error;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ResolvedTitles;
    use crate::predicate::KeywordRegistry;
    use crate::strategy::{DisabledStrategies, ImdbStrategyProvider};
    use crate::testing::{fixtures, MockAdapter, MockResolver};

    fn handles(adapters: &[Arc<MockAdapter>]) -> Vec<Arc<dyn AdapterHandle>> {
        adapters
            .iter()
            .map(|a| Arc::clone(a) as Arc<dyn AdapterHandle>)
            .collect()
    }

    fn disabled() -> Aggregator {
        Aggregator::new(Arc::new(DisabledStrategies)).with_deadline(Duration::from_secs(5))
    }

    #[test]
    fn test_fold_status() {
        let mut report = AdapterReport::not_attempted("a");
        fold_status(&mut report, AdapterStatus::Ok, None);
        assert_eq!(report.status, AdapterStatus::Ok);

        fold_status(&mut report, AdapterStatus::Timeout, Some("slow".to_string()));
        assert_eq!(report.status, AdapterStatus::Timeout);

        fold_status(&mut report, AdapterStatus::Error, Some("boom".to_string()));
        fold_status(&mut report, AdapterStatus::Ok, None);
        assert_eq!(report.status, AdapterStatus::Timeout);
        assert_eq!(report.error.as_deref(), Some("slow"));
    }

    #[tokio::test]
    async fn test_merges_and_ranks() {
        let a = Arc::new(MockAdapter::new("a"));
        a.set_results(vec![
            fixtures::release("A1", "a1", 3.0),
            fixtures::release("A2", "a2", 1.0),
        ])
        .await;
        let b = Arc::new(MockAdapter::new("b"));
        b.set_results(vec![fixtures::release("B1", "b1", 2.0)]).await;

        let result = disabled()
            .aggregate(&SearchRequest::text("x"), &handles(&[a, b]))
            .await
            .unwrap();

        let titles: Vec<&str> = result.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["A1", "B1", "A2"]);
        assert_eq!(result.report("a").unwrap().count, 2);
        assert_eq!(result.report("b").unwrap().status, AdapterStatus::Ok);
        assert_eq!(result.view, "all");
    }

    #[tokio::test]
    async fn test_unconfigured_and_excluded_not_attempted() {
        let mut unconfigured = AdapterMetadata::new("unconfigured");
        unconfigured.configured = false;
        let mut french = AdapterMetadata::new("french");
        french.language = "fr-FR".to_string();

        let adapters = vec![
            Arc::new(MockAdapter::with_metadata(unconfigured)),
            Arc::new(MockAdapter::with_metadata(french)),
            Arc::new(MockAdapter::new("english")),
        ];
        for a in &adapters {
            a.set_results(vec![fixtures::release("R", &a.metadata().id, 1.0)])
                .await;
        }

        let predicate = KeywordRegistry::with_defaults().parse("lang:en").unwrap();
        let aggregator = disabled().with_predicate(predicate);
        let result = aggregator
            .aggregate(&SearchRequest::text("x"), &handles(&adapters))
            .await
            .unwrap();

        assert_eq!(result.records.len(), 1);
        assert_eq!(
            result.report("unconfigured").unwrap().status,
            AdapterStatus::NotAttempted
        );
        assert_eq!(result.report("french").unwrap().status, AdapterStatus::NotAttempted);
        assert_eq!(result.report("english").unwrap().status, AdapterStatus::Ok);
        assert_eq!(adapters[0].query_count().await, 0);
        assert_eq!(adapters[1].query_count().await, 0);

        let active = aggregator.active_adapters(&handles(&adapters));
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].metadata().id, "english");
    }

    #[tokio::test]
    async fn test_no_adapters_policy() {
        let request = SearchRequest::text("x");

        let result = disabled().aggregate(&request, &[]).await.unwrap();
        assert!(result.records.is_empty());
        assert!(result.adapters.is_empty());

        let err = disabled()
            .with_require_adapters(true)
            .with_name("hd")
            .aggregate(&request, &[])
            .await
            .unwrap_err();
        assert_eq!(err, AggregateError::NoAdaptersConfigured("hd".to_string()));
    }

    #[tokio::test]
    async fn test_adapter_unable_to_handle_is_not_attempted() {
        let a = Arc::new(MockAdapter::new("text-only").text_only());
        a.set_results(vec![fixtures::release("R", "r", 1.0)]).await;

        let result = disabled()
            .aggregate(&SearchRequest::imdb("tt0111161"), &handles(&[a.clone()]))
            .await
            .unwrap();

        assert!(result.records.is_empty());
        assert_eq!(
            result.report("text-only").unwrap().status,
            AdapterStatus::NotAttempted
        );
        assert_eq!(a.query_count().await, 0);
    }

    #[tokio::test]
    async fn test_limit_and_offset() {
        let a = Arc::new(MockAdapter::new("a"));
        a.set_results(
            (0..10)
                .map(|i| fixtures::release(&format!("r{}", i), &format!("l{}", i), i as f64))
                .collect(),
        )
        .await;

        let request = SearchRequest::text("x").with_offset(2).with_limit(3);
        let result = disabled()
            .aggregate(&request, &handles(&[a]))
            .await
            .unwrap();

        let gains: Vec<f64> = result.records.iter().map(|r| r.gain).collect();
        assert_eq!(gains, vec![7.0, 6.0, 5.0]);
    }

    #[tokio::test]
    async fn test_fallback_resolution_failure_is_a_notice() {
        let resolver = Arc::new(MockResolver::new());
        let provider = ImdbStrategyProvider::new(resolver);
        let text_only = Arc::new(MockAdapter::new("text-only").text_only());
        let imdb = Arc::new(MockAdapter::new("imdb"));
        let mut record = fixtures::release("Whatever", "w", 1.0);
        record.imdb = Some(111161);
        imdb.set_results(vec![record]).await;

        let result = Aggregator::new(Arc::new(provider))
            .aggregate(&SearchRequest::imdb("tt0111161"), &handles(&[text_only.clone(), imdb]))
            .await
            .unwrap();

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.fallback_queries, 0);
        assert!(result
            .notices
            .iter()
            .any(|n| matches!(n, AggregateNotice::FallbackUnavailable { .. })));
        assert_eq!(text_only.query_count().await, 0);
    }

    #[tokio::test]
    async fn test_fallback_dispatches_derived_requests() {
        let resolver = Arc::new(MockResolver::new());
        resolver
            .add_titles(
                "tt0111161",
                ResolvedTitles::new("The Shawshank Redemption").with_alternates(["Die Verurteilten"]),
            )
            .await;
        let text_only = Arc::new(MockAdapter::new("text-only").text_only());

        let result = Aggregator::new(Arc::new(ImdbStrategyProvider::new(resolver)))
            .aggregate(&SearchRequest::imdb("tt0111161"), &handles(&[text_only.clone()]))
            .await
            .unwrap();

        assert_eq!(result.fallback_queries, 2);
        let report = result.report("text-only").unwrap();
        assert_eq!(report.operations, 2);
        assert_eq!(report.status, AdapterStatus::Ok);

        let terms: Vec<String> = text_only
            .recorded_queries()
            .await
            .into_iter()
            .map(|r| r.term)
            .collect();
        assert!(terms.contains(&"The Shawshank Redemption".to_string()));
        assert!(terms.contains(&"Die Verurteilten".to_string()));
    }
}
