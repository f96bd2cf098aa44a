//! CLI commands

pub mod graph;
pub mod redact;
pub mod render;

use console::style;
use std::path::Path;
use tracing::warn;
use vessel_core::{Config, ConfigValues};

use crate::error::Result;

/// Load a schema and overlay an optional values file
pub(crate) fn load_config(config_path: &Path, values_path: Option<&Path>) -> Result<Config> {
    let mut config = Config::from_file(config_path)?;

    if let Some(values_path) = values_path {
        let values = ConfigValues::from_file(values_path)?;
        let unmatched = config.apply_values(&values);

        for name in unmatched {
            warn!(item = %name, "value supplied for an item the schema does not declare");
            eprintln!(
                "{} ignoring value for unknown item '{}'",
                style("warning:").yellow().bold(),
                name
            );
        }
    }

    Ok(config)
}
