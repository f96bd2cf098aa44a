//! Configuration schema documents
//!
//! A `Config` is the vendor-defined schema shown to operators. It is made of
//! ordered groups, each holding ordered items. Item `default` and `value`
//! strings are templates that may reference other items by name; they are
//! rendered by `vessel-engine` in dependency order.
//!
//! ```yaml
//! apiVersion: vessel.io/v1beta1
//! kind: Config
//! metadata:
//!   name: my-app
//! spec:
//!   groups:
//!     - name: database
//!       title: Database
//!       items:
//!         - name: db_host
//!           type: text
//!           default: postgres
//!         - name: db_url
//!           type: text
//!           default: 'postgres://{{ ConfigOption("db_host") }}:5432'
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::values::ConfigValues;

/// Kind expected for schema documents
pub const CONFIG_KIND: &str = "Config";

/// apiVersion written when none is given
pub const DEFAULT_API_VERSION: &str = "vessel.io/v1beta1";

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_kind() -> String {
    CONFIG_KIND.to_string()
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A configuration schema document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_kind")]
    pub kind: String,

    #[serde(default)]
    pub metadata: ConfigMetadata,

    #[serde(default)]
    pub spec: ConfigSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSpec {
    #[serde(default)]
    pub groups: Vec<ConfigGroup>,
}

/// A titled group of items, rendered as one section in the admin console
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigGroup {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub items: Vec<ConfigItem>,
}

/// Input widget type of an item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    #[default]
    Text,
    Textarea,
    Bool,
    Password,
    File,
    SelectOne,
    SelectMany,
    Radio,
    Dropdown,
    Label,
    Heading,
}

/// A single named setting
///
/// `default` and `value` hold unrendered templates. YAML scalars such as
/// `true` or `3` are accepted and kept as their string form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConfigItem {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,

    #[serde(rename = "type", default)]
    pub item_type: ItemType,

    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "String::is_empty")]
    pub default: String,

    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "String::is_empty")]
    pub value: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub readonly: bool,

    /// Child options for select-style items
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ConfigChildItem>,
}

/// An option of a select-style item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigChildItem {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub recommended: bool,

    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "String::is_empty")]
    pub default: String,

    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "String::is_empty")]
    pub value: String,
}

impl ConfigItem {
    /// Create a text item with the given templates
    pub fn new(name: impl Into<String>, default: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// The unrendered value, falling back to the unrendered default
    pub fn raw_value(&self) -> &str {
        if self.value.is_empty() {
            &self.default
        } else {
            &self.value
        }
    }

    /// Position of `option` among the child options
    pub fn child_index(&self, option: &str) -> Option<usize> {
        self.items.iter().position(|child| child.name == option)
    }
}

impl Config {
    /// Create an empty schema with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ConfigMetadata { name: name.into() },
            spec: ConfigSpec::default(),
        }
    }

    /// Add a group (builder style)
    pub fn with_group(mut self, group: ConfigGroup) -> Self {
        self.spec.groups.push(group);
        self
    }

    /// Load a schema from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a schema from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        if config.kind != CONFIG_KIND {
            return Err(CoreError::InvalidConfig {
                message: format!("expected kind '{}', found '{}'", CONFIG_KIND, config.kind),
            });
        }
        Ok(config)
    }

    /// Serialize the schema back to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// All items in declaration order (group order, then item order)
    pub fn items(&self) -> impl Iterator<Item = &ConfigItem> {
        self.spec.groups.iter().flat_map(|g| g.items.iter())
    }

    pub fn items_mut(&mut self) -> impl Iterator<Item = &mut ConfigItem> {
        self.spec.groups.iter_mut().flat_map(|g| g.items.iter_mut())
    }

    /// Find an item by name
    pub fn item(&self, name: &str) -> Option<&ConfigItem> {
        self.items().find(|item| item.name == name)
    }

    pub fn item_count(&self) -> usize {
        self.spec.groups.iter().map(|g| g.items.len()).sum()
    }

    /// Check that every item has a non-empty name, unique across the schema
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashMap<&str, &str> = HashMap::new();

        for group in &self.spec.groups {
            for item in &group.items {
                if item.name.trim().is_empty() {
                    return Err(CoreError::EmptyItemName {
                        group: group.name.clone(),
                    });
                }
                if let Some(first_group) = seen.insert(&item.name, &group.name) {
                    return Err(CoreError::DuplicateItem {
                        name: item.name.clone(),
                        first_group: first_group.to_string(),
                        second_group: group.name.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Overlay user-supplied values onto the item templates
    ///
    /// Returns the names in `values` that match no item.
    pub fn apply_values(&mut self, values: &ConfigValues) -> Vec<String> {
        for item in self.items_mut() {
            if let Some(supplied) = values.get(&item.name) {
                if let Some(value) = &supplied.value {
                    item.value = value.clone();
                }
                if let Some(default) = &supplied.default {
                    item.default = default.clone();
                }
            }
        }

        values
            .names()
            .filter(|name| self.item(name).is_none())
            .map(String::from)
            .collect()
    }
}

impl ConfigGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an item (builder style)
    pub fn with_item(mut self, item: ConfigItem) -> Self {
        self.items.push(item);
        self
    }
}

/// Accept any YAML scalar where a template string is expected
pub(crate) fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_scalar_string(deserializer)?.unwrap_or_default())
}

pub(crate) fn optional_scalar_string<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(None),
        serde_yaml::Value::Bool(b) => Ok(Some(b.to_string())),
        serde_yaml::Value::Number(n) => Ok(Some(n.to_string())),
        serde_yaml::Value::String(s) => Ok(Some(s)),
        other => Err(D::Error::custom(format!(
            "expected a string or scalar, found {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
apiVersion: vessel.io/v1beta1
kind: Config
metadata:
  name: my-app
spec:
  groups:
    - name: database
      title: Database
      items:
        - name: db_type
          type: select_one
          default: embedded
          items:
            - name: embedded
              title: Embedded
            - name: external
              title: External
        - name: db_host
          type: text
          default: '{{ ConfigOption("db_type") }}-postgres'
    - name: tuning
      items:
        - name: replicas
          default: 3
        - name: debug
          type: bool
          value: true
"#;

    #[test]
    fn test_parse_schema() {
        let config = Config::from_yaml(SCHEMA).unwrap();

        assert_eq!(config.metadata.name, "my-app");
        assert_eq!(config.spec.groups.len(), 2);
        assert_eq!(config.item_count(), 4);

        let db_type = config.item("db_type").unwrap();
        assert_eq!(db_type.item_type, ItemType::SelectOne);
        assert_eq!(db_type.items.len(), 2);
    }

    #[test]
    fn test_scalars_become_strings() {
        let config = Config::from_yaml(SCHEMA).unwrap();

        assert_eq!(config.item("replicas").unwrap().default, "3");
        assert_eq!(config.item("debug").unwrap().value, "true");
        assert_eq!(config.item("debug").unwrap().item_type, ItemType::Bool);
    }

    #[test]
    fn test_items_in_declaration_order() {
        let config = Config::from_yaml(SCHEMA).unwrap();
        let names: Vec<&str> = config.items().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["db_type", "db_host", "replicas", "debug"]);
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let yaml = "kind: ConfigValues\nspec: {}\n";
        let result = Config::from_yaml(yaml);
        assert!(matches!(result, Err(CoreError::InvalidConfig { .. })));
    }

    #[test]
    fn test_validate_duplicate_names() {
        let config = Config::new("dup")
            .with_group(ConfigGroup::new("a").with_item(ConfigItem::new("x", "1", "")))
            .with_group(ConfigGroup::new("b").with_item(ConfigItem::new("x", "2", "")));

        match config.validate() {
            Err(CoreError::DuplicateItem {
                name,
                first_group,
                second_group,
            }) => {
                assert_eq!(name, "x");
                assert_eq!(first_group, "a");
                assert_eq!(second_group, "b");
            }
            other => panic!("expected duplicate error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_empty_name() {
        let config = Config::new("empty")
            .with_group(ConfigGroup::new("main").with_item(ConfigItem::new(" ", "", "")));
        assert!(matches!(
            config.validate(),
            Err(CoreError::EmptyItemName { .. })
        ));
    }

    #[test]
    fn test_raw_value_fallback() {
        let item = ConfigItem::new("a", "fallback", "");
        assert_eq!(item.raw_value(), "fallback");

        let item = ConfigItem::new("a", "fallback", "set");
        assert_eq!(item.raw_value(), "set");
    }

    #[test]
    fn test_child_index() {
        let config = Config::from_yaml(SCHEMA).unwrap();
        let db_type = config.item("db_type").unwrap();
        assert_eq!(db_type.child_index("embedded"), Some(0));
        assert_eq!(db_type.child_index("external"), Some(1));
        assert_eq!(db_type.child_index("sqlite"), None);
    }

    #[test]
    fn test_apply_values() {
        let mut config = Config::from_yaml(SCHEMA).unwrap();
        let values = ConfigValues::new("my-app")
            .with_value("db_type", "external")
            .with_value("unknown_item", "x");

        let unmatched = config.apply_values(&values);

        assert_eq!(config.item("db_type").unwrap().value, "external");
        assert_eq!(config.item("db_type").unwrap().default, "embedded");
        assert_eq!(unmatched, vec!["unknown_item".to_string()]);
    }

    #[test]
    fn test_round_trip_keeps_templates() {
        let config = Config::from_yaml(SCHEMA).unwrap();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains(r#"ConfigOption("db_type")"#));

        let reparsed = Config::from_yaml(&yaml).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_from_file_missing() {
        let result = Config::from_file("/nonexistent/config.yaml");
        assert!(matches!(result, Err(CoreError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, SCHEMA).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.item_count(), 4);
    }
}
