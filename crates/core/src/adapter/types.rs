//! Types for the source adapter boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bytes per GiB, used by the default gain computation.
const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// What kind of query a request represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Free-text search.
    #[default]
    Search,
    /// TV search (season/episode aware).
    TvSearch,
    /// Movie search (identifier aware).
    MovieSearch,
    /// Listing of the adapters behind an aggregate view.
    IndexerList,
}

/// Canonical, adapter-agnostic description of a search.
///
/// Requests are cloned per dispatched operation and never mutated after
/// dispatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text search term.
    #[serde(default)]
    pub term: String,
    /// Newznab-style category ids.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<u32>,
    /// IMDb id, e.g. `tt0111161`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    /// TMDB numeric id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<u32>,
    /// TVDB numeric id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvdb_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<String>,
    /// Maximum records to return (0 or absent = unlimited).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Records to skip after ranking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(default)]
    pub kind: QueryKind,
}

impl SearchRequest {
    /// Create a plain free-text search.
    pub fn text(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Default::default()
        }
    }

    /// Create a movie search keyed by IMDb id.
    pub fn imdb(imdb_id: impl Into<String>) -> Self {
        Self {
            imdb_id: Some(imdb_id.into()),
            kind: QueryKind::MovieSearch,
            ..Default::default()
        }
    }

    /// Set the result limit.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the result offset.
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// The IMDb id, if present and non-blank.
    pub fn imdb_id(&self) -> Option<&str> {
        self.imdb_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Derive a text request for fallback dispatch.
    ///
    /// The clone keeps categories, season/episode and paging but drops the
    /// identifiers, so adapters that only speak free text can serve it.
    pub fn derive_with_term(&self, term: impl Into<String>) -> Self {
        let mut derived = self.clone();
        derived.term = term.into();
        derived.imdb_id = None;
        derived.tmdb_id = None;
        derived.tvdb_id = None;
        if derived.kind == QueryKind::MovieSearch {
            derived.kind = QueryKind::Search;
        }
        derived
    }
}

/// One candidate search result produced by an adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    /// Release title as reported by the adapter.
    pub title: String,
    /// Canonical link (download or magnet URI).
    pub link: String,
    /// Adapter-specific unique id, when different from the link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<DateTime<Utc>>,
    /// Size in bytes.
    pub size_bytes: u64,
    pub seeders: u32,
    pub peers: u32,
    /// Relevance/quality score used for ranking.
    pub gain: f64,
    /// Numeric IMDb id the adapter matched this record against, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb: Option<u64>,
    /// Id of the adapter that produced the record.
    pub origin: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<u32>,
}

impl ReleaseRecord {
    /// Seeders times size in GiB, for adapters that do not score records.
    pub fn default_gain(seeders: u32, size_bytes: u64) -> f64 {
        seeders as f64 * (size_bytes as f64 / BYTES_PER_GIB)
    }
}

/// Privacy type of an adapter's backing site.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AdapterKind {
    #[default]
    Public,
    SemiPrivate,
    Private,
}

impl AdapterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::Public => "public",
            AdapterKind::SemiPrivate => "semi-private",
            AdapterKind::Private => "private",
        }
    }
}

/// Health of an adapter as tracked by its owner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    Failing,
    /// Never queried, or no recent information.
    #[default]
    Unknown,
}

/// Outcome of the adapter's most recent self-test.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    Passed,
    Failed,
}

/// Descriptive snapshot of an adapter, evaluated by predicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterMetadata {
    /// Stable adapter identifier.
    pub id: String,
    /// Whether the adapter has been configured (credentials, URL, ...).
    pub configured: bool,
    /// Site language, e.g. `en-US`.
    pub language: String,
    pub kind: AdapterKind,
    /// Free-form group tags assigned by the operator.
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub health: AdapterHealth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_test: Option<TestOutcome>,
}

impl AdapterMetadata {
    /// Create metadata for a configured public `en-US` adapter.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            configured: true,
            language: "en-US".to_string(),
            kind: AdapterKind::Public,
            groups: Vec::new(),
            health: AdapterHealth::Unknown,
            last_test: None,
        }
    }
}

/// Errors an adapter can report for a single query.
///
/// The orchestrator treats every variant the same way: the adapter produced
/// nothing this round.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    #[error("Adapter connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Adapter returned an error: {0}")]
    Upstream(String),

    #[error("Failed to parse adapter response: {0}")]
    Parse(String),

    #[error("Adapter is not configured")]
    NotConfigured,

    #[error("Internal adapter error: {0}")]
    Internal(String),
}

/// The orchestrator's view of one source.
#[async_trait]
pub trait AdapterHandle: Send + Sync {
    /// Current metadata snapshot.
    fn metadata(&self) -> AdapterMetadata;

    /// Whether the adapter can serve this request as-is.
    fn can_handle(&self, request: &SearchRequest) -> bool;

    /// Run one query against the source.
    async fn query(&self, request: &SearchRequest) -> Result<Vec<ReleaseRecord>, AdapterError>;
}
