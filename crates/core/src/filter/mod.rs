//! Relevance filtering of merged results.
//!
//! Fallback broadens a search from "this exact movie" to "anything titled
//! like it", so the merged set can contain releases of other movies. The
//! IMDb title filter removes the ones that are provably irrelevant.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::adapter::{ReleaseRecord, SearchRequest};
use crate::aggregator::deduplicate;
use crate::metadata::{ResolutionError, TitleLookup};

/// Characters that adapters commonly drop or mangle in release names.
static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[:;,!?'"]"#).unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Outcome of filtering.
#[derive(Debug, Clone)]
pub struct FilteredResults {
    /// Surviving records, in input order.
    pub records: Vec<ReleaseRecord>,
    /// Number of input records dropped.
    pub removed: usize,
    /// Set when titles could not be resolved and unresolved records were
    /// kept unfiltered.
    pub degraded: Option<ResolutionError>,
}

impl FilteredResults {
    fn unchanged(records: Vec<ReleaseRecord>) -> Self {
        Self {
            records,
            removed: 0,
            degraded: None,
        }
    }
}

/// A per-request result filter.
#[derive(Debug)]
pub enum ResultFilter {
    /// Returns its input unchanged.
    NoOp,
    /// Filters by resolved IMDb id and title.
    ImdbTitle(ImdbTitleFilter),
}

impl ResultFilter {
    /// Filter `records`, waiting at most `budget` for title resolution if it
    /// has not happened yet.
    pub async fn filter_results(
        &self,
        records: Vec<ReleaseRecord>,
        budget: Duration,
    ) -> FilteredResults {
        match self {
            ResultFilter::NoOp => FilteredResults::unchanged(records),
            ResultFilter::ImdbTitle(filter) => filter.filter_results(records, budget).await,
        }
    }

    /// Start title resolution in the background so it overlaps the adapter
    /// queries. The outcome is memoized for [`filter_results`](Self::filter_results).
    pub fn prefetch(&self, budget: Duration) -> Option<JoinHandle<()>> {
        match self {
            ResultFilter::NoOp => None,
            ResultFilter::ImdbTitle(filter) => filter.prefetch(budget),
        }
    }
}

/// Keeps records matched to the requested IMDb id, drops records matched to a
/// different one, and keeps unmatched records only if their title contains a
/// known title of the requested movie.
#[derive(Debug)]
pub struct ImdbTitleFilter {
    request: SearchRequest,
    titles: Arc<TitleLookup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Match {
    Perfect,
    Wrong,
    Unresolved,
}

impl ImdbTitleFilter {
    pub fn new(request: SearchRequest, titles: Arc<TitleLookup>) -> Self {
        Self { request, titles }
    }

    fn prefetch(&self, budget: Duration) -> Option<JoinHandle<()>> {
        if self.titles.is_resolved() {
            return None;
        }
        let titles = Arc::clone(&self.titles);
        Some(tokio::spawn(async move {
            // Failures are memoized and logged by the lookup
            let _ = titles.resolve(budget).await;
        }))
    }

    async fn filter_results(&self, records: Vec<ReleaseRecord>, budget: Duration) -> FilteredResults {
        let total = records.len();
        let wanted = self.request.imdb_id().and_then(parse_imdb_digits);
        if wanted.is_none() && records.iter().any(|r| r.imdb.is_some()) {
            warn!(
                imdb_id = ?self.request.imdb_id(),
                "Unparsable IMDb id, filtering by title only"
            );
        }

        let classified: Vec<(Match, ReleaseRecord)> = records
            .into_iter()
            .map(|r| {
                let class = match (wanted, r.imdb) {
                    (Some(wanted), Some(id)) if id == wanted => Match::Perfect,
                    (Some(_), Some(_)) => Match::Wrong,
                    _ => Match::Unresolved,
                };
                (class, r)
            })
            .collect();

        let has_unresolved = classified.iter().any(|(c, _)| *c == Match::Unresolved);
        let mut degraded = None;
        let variants = if has_unresolved {
            match self.titles.resolve(budget).await {
                Ok(titles) => Some(title_variants(&titles.all())),
                Err(e) => {
                    warn!(error = %e, "Title filter degraded, keeping unresolved records");
                    degraded = Some(e);
                    None
                }
            }
        } else {
            None
        };

        let kept: Vec<ReleaseRecord> = classified
            .into_iter()
            .filter(|(class, record)| match class {
                Match::Perfect => true,
                Match::Wrong => false,
                Match::Unresolved => match &variants {
                    Some(variants) if !variants.is_empty() => title_matches(&record.title, variants),
                    _ => true,
                },
            })
            .map(|(_, record)| record)
            .collect();

        let records = deduplicate(kept);
        let removed = total - records.len();
        debug!(total, kept = records.len(), removed, "Title filter applied");

        FilteredResults {
            records,
            removed,
            degraded,
        }
    }
}

/// Extract the numeric part of an IMDb id (`tt0111161` -> 111161).
fn parse_imdb_digits(imdb_id: &str) -> Option<u64> {
    DIGITS.find(imdb_id)?.as_str().parse().ok()
}

/// Lowercase, without the unsafe characters, whitespace collapsed.
fn normalize_title(title: &str) -> String {
    let cleaned = UNSAFE_CHARS.replace_all(title, "");
    WHITESPACE
        .replace_all(cleaned.trim(), " ")
        .to_lowercase()
}

/// Lowercase matching variants for each title: dotted, underscored, spaced.
fn title_variants(titles: &[&str]) -> Vec<String> {
    let mut variants: Vec<String> = Vec::new();
    for title in titles {
        let cleaned = normalize_title(title);
        if cleaned.is_empty() {
            continue;
        }
        for variant in [
            cleaned.replace(' ', "."),
            cleaned.replace(' ', "_"),
            cleaned,
        ] {
            if !variants.contains(&variant) {
                variants.push(variant);
            }
        }
    }
    variants
}

/// The record title goes through the same cleanup as the variants.
fn title_matches(title: &str, variants: &[String]) -> bool {
    let title = normalize_title(title);
    variants.iter().any(|v| title.contains(v.as_str()))
}
