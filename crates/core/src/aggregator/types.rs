//! Types for aggregate results.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::adapter::ReleaseRecord;

/// What happened to one adapter during an aggregate call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AdapterStatus {
    /// Every operation completed before the deadline.
    Ok,
    /// At least one operation returned an error.
    Error,
    /// At least one operation was still running at the deadline.
    Timeout,
    /// Unconfigured, excluded by the view filter, or unable to serve the
    /// request or any fallback request.
    NotAttempted,
}

impl AdapterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterStatus::Ok => "ok",
            AdapterStatus::Error => "error",
            AdapterStatus::Timeout => "timeout",
            AdapterStatus::NotAttempted => "not_attempted",
        }
    }
}

/// Per-adapter outcome of an aggregate call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdapterReport {
    /// Adapter identifier.
    pub adapter: String,
    pub status: AdapterStatus,
    /// Records delivered before the deadline (before filtering).
    pub count: usize,
    /// Operations launched against this adapter (primary + fallback).
    pub operations: usize,
    /// First error message, for `Error` and `Timeout`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AdapterReport {
    pub(crate) fn not_attempted(adapter: impl Into<String>) -> Self {
        Self {
            adapter: adapter.into(),
            status: AdapterStatus::NotAttempted,
            count: 0,
            operations: 0,
            error: None,
        }
    }
}

/// Explains why a result may be smaller than expected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregateNotice {
    /// Fallback queries could not be derived.
    FallbackUnavailable { reason: String },
    /// The result filter could not resolve titles and kept unresolved
    /// records unfiltered.
    FilterDegraded { reason: String },
}

/// Merged, ranked output of one aggregate call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Identifier for correlating logs.
    pub id: Uuid,
    /// Name of the view that produced the result.
    pub view: String,
    /// Ranked records (descending gain).
    pub records: Vec<ReleaseRecord>,
    /// One report per supplied adapter, in input order.
    pub adapters: Vec<AdapterReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<AggregateNotice>,
    /// Fallback operations launched.
    pub fallback_queries: usize,
    /// Records removed by the relevance filter.
    pub filtered_out: usize,
    pub duration_ms: u64,
}

impl AggregateResult {
    /// Report for one adapter.
    pub fn report(&self, adapter: &str) -> Option<&AdapterReport> {
        self.adapters.iter().find(|r| r.adapter == adapter)
    }

    /// Adapters that errored or timed out.
    pub fn failed_adapters(&self) -> Vec<&AdapterReport> {
        self.adapters
            .iter()
            .filter(|r| matches!(r.status, AdapterStatus::Error | AdapterStatus::Timeout))
            .collect()
    }
}

/// Errors that abort an aggregate call.
///
/// Adapter and resolver failures never show up here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("No adapters configured for view '{0}'")]
    NoAdaptersConfigured(String),

    #[error("Unknown aggregate view: {0}")]
    UnknownView(String),
}
