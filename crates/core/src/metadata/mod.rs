//! External metadata resolver boundary.
//!
//! The resolver expands an identifier (an IMDb id) into the titles a release
//! may be published under. Fallback queries and result filtering both consume
//! it through a per-request [`TitleLookup`].

mod lookup;
mod types;

pub use lookup::TitleLookup;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when resolving titles.
///
/// Always absorbed by the aggregator into degraded behavior.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    /// Identifier unknown to the resolver.
    #[error("Identifier not found: {0}")]
    NotFound(String),

    /// Transport or upstream failure.
    #[error("Resolver request failed: {0}")]
    RequestFailed(String),

    /// Failed to parse the resolver's response.
    #[error("Failed to parse resolver response: {0}")]
    ParseError(String),

    /// Resolver not configured (missing API key, etc.).
    #[error("Resolver not configured: {0}")]
    NotConfigured(String),

    /// Resolution did not finish within its time budget.
    #[error("Title resolution timed out")]
    Timeout,
}

/// Trait for external title resolvers.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Resolve the primary and alternate titles for an IMDb id.
    async fn resolve_titles(&self, imdb_id: &str) -> Result<ResolvedTitles, ResolutionError>;
}
