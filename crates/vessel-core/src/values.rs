//! User-supplied configuration values
//!
//! A `ConfigValues` document carries the operator's answers to a `Config`
//! schema. Applying it replaces item `value` templates before rendering.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::optional_scalar_string;
use crate::error::{CoreError, Result};

/// Kind expected for values documents
pub const CONFIG_VALUES_KIND: &str = "ConfigValues";

fn default_api_version() -> String {
    crate::config::DEFAULT_API_VERSION.to_string()
}

fn default_kind() -> String {
    CONFIG_VALUES_KIND.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigValues {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_kind")]
    pub kind: String,

    #[serde(default)]
    pub metadata: crate::config::ConfigMetadata,

    #[serde(default)]
    pub spec: ConfigValuesSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigValuesSpec {
    /// Values keyed by item name (insertion order preserved)
    #[serde(default)]
    pub values: IndexMap<String, ConfigValue>,
}

/// One supplied value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigValue {
    #[serde(default, deserialize_with = "optional_scalar_string", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar_string", skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Original filename for `file` items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl ConfigValues {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: crate::config::ConfigMetadata { name: name.into() },
            spec: ConfigValuesSpec::default(),
        }
    }

    /// Load values from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse values from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let values: ConfigValues = serde_yaml::from_str(yaml)?;
        if values.kind != CONFIG_VALUES_KIND {
            return Err(CoreError::InvalidConfig {
                message: format!(
                    "expected kind '{}', found '{}'",
                    CONFIG_VALUES_KIND, values.kind
                ),
            });
        }
        Ok(values)
    }

    /// Set a value for an item (builder style)
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.values.insert(
            name.into(),
            ConfigValue {
                value: Some(value.into()),
                ..Default::default()
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.spec.values.get(name)
    }

    /// Item names with a supplied value
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.spec.values.keys()
    }

    pub fn len(&self) -> usize {
        self.spec.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spec.values.is_empty()
    }
}
