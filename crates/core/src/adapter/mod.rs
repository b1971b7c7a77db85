//! Source adapter contract.
//!
//! Adapters wrap individual indexers (each with its own query dialect and
//! capabilities). They are owned by an external registry; the aggregator only
//! ever sees them as shared `Arc<dyn AdapterHandle>` values.

mod types;

pub use types::*;
