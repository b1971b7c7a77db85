use std::collections::HashSet;

use super::{types::Config, ConfigError};
use crate::aggregator::ALL_VIEW;

/// Validate configuration
/// Currently validates:
/// - Aggregator deadline is not 0
/// - View names are non-empty, unique and don't shadow the "all" view
///
/// Filter expressions are checked when views are built.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.aggregator.deadline_ms == 0 {
        return Err(ConfigError::ValidationError(
            "aggregator.deadline_ms cannot be 0".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for view in &config.views {
        let name = view.name.trim();
        if name.is_empty() {
            return Err(ConfigError::ValidationError(
                "views.name cannot be empty".to_string(),
            ));
        }
        if name.eq_ignore_ascii_case(ALL_VIEW) {
            return Err(ConfigError::ValidationError(format!(
                "views.name '{}' is reserved",
                ALL_VIEW
            )));
        }
        if !names.insert(name.to_lowercase()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate view name '{}'",
                name
            )));
        }
    }

    Ok(())
}
