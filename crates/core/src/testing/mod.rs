//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the adapter and metadata
//! resolver traits, allowing aggregate searches to be tested without real
//! indexers.
//!
//! # Example
//!
//! ```rust,ignore
//! use fedsearch_core::testing::{fixtures, MockAdapter, MockResolver};
//!
//! let adapter = MockAdapter::new("public-1");
//! let resolver = MockResolver::new();
//!
//! // Configure mock responses
//! adapter.set_results(vec![fixtures::release("Title", "magnet:?xt=urn:btih:abc", 1.0)]).await;
//! resolver.add_titles("tt0111161", ResolvedTitles::new("The Shawshank Redemption")).await;
//! ```

mod mock_adapter;
mod mock_resolver;

pub use mock_adapter::{MockAdapter, RecordedQuery};
pub use mock_resolver::MockResolver;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::adapter::{AdapterKind, AdapterMetadata, ReleaseRecord};

    /// Create a test release record with reasonable defaults.
    pub fn release(title: &str, link: &str, gain: f64) -> ReleaseRecord {
        ReleaseRecord {
            title: title.to_string(),
            link: link.to_string(),
            guid: None,
            publish_date: None,
            size_bytes: 1024 * 1024 * 1024, // 1 GiB
            seeders: 50,
            peers: 60,
            gain,
            imdb: None,
            origin: "mock-adapter".to_string(),
            categories: vec![2000],
        }
    }

    /// Create a test movie release matched to an IMDb id.
    pub fn movie_release(title: &str, link: &str, imdb: u64, gain: f64) -> ReleaseRecord {
        let mut record = release(title, link, gain);
        record.imdb = Some(imdb);
        record
    }

    /// Create adapter metadata with the given language and kind.
    pub fn adapter_metadata(id: &str, language: &str, kind: AdapterKind) -> AdapterMetadata {
        let mut metadata = AdapterMetadata::new(id);
        metadata.language = language.to_string();
        metadata.kind = kind;
        metadata
    }
}
