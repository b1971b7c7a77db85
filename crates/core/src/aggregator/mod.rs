//! Federated search aggregation.
//!
//! An [`Aggregator`] fans one [`SearchRequest`](crate::adapter::SearchRequest)
//! out to every selected adapter under a joint deadline, adds fallback queries
//! for adapters that can't serve it, then filters, deduplicates and ranks the
//! merged records. [`AggregateViews`] groups aggregators by name.

mod ranking;
mod runner;
mod types;
mod views;

pub use ranking::{deduplicate, paginate, rank};
pub use runner::{Aggregator, ALL_VIEW};
pub use types::*;
pub use views::AggregateViews;
