pub mod adapter;
pub mod aggregator;
pub mod config;
pub mod fallback;
pub mod filter;
pub mod metadata;
pub mod metrics;
pub mod predicate;
pub mod strategy;
pub mod testing;

pub use adapter::{
    AdapterError, AdapterHandle, AdapterHealth, AdapterKind, AdapterMetadata, QueryKind,
    ReleaseRecord, SearchRequest, TestOutcome,
};
pub use aggregator::{
    AdapterReport, AdapterStatus, AggregateError, AggregateNotice, AggregateResult,
    AggregateViews, Aggregator,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AggregatorConfig, Config, ConfigError,
    ViewConfig,
};
pub use metadata::{MetadataResolver, ResolutionError, ResolvedTitles};
pub use predicate::{KeywordRegistry, Predicate, PredicateError};
pub use strategy::{
    create_strategy_provider, DisabledStrategies, ImdbStrategyProvider, StrategyProvider,
};
