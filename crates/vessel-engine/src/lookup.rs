//! Config lookup functions used by the resolution pass

use indexmap::IndexMap;
use minijinja::Value;
use std::sync::Arc;
use tracing::warn;
use vessel_core::Config;

use crate::functions::{FunctionTable, decode_base64, string_arg};
use crate::resolve::ResolvedValue;
use crate::suggestions::suggest_item_name;

#[derive(Debug, Clone, PartialEq)]
struct LookupEntry {
    effective: String,
    /// Position of `effective` among the child options
    index: Option<usize>,
}

/// Immutable snapshot of item values for one batch
///
/// Items resolved in an earlier batch contribute their rendered effective
/// value. Everything else falls back to the raw schema value, then default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigLookup {
    entries: IndexMap<String, LookupEntry>,
}

impl ConfigLookup {
    pub fn new(config: &Config, resolved: &IndexMap<String, ResolvedValue>) -> Self {
        let entries = config
            .items()
            .map(|item| {
                let effective = match resolved.get(&item.name) {
                    Some(value) => value.effective().to_string(),
                    None => item.raw_value().to_string(),
                };
                let index = item.child_index(&effective);
                (item.name.clone(), LookupEntry { effective, index })
            })
            .collect();

        Self { entries }
    }

    /// Effective value of `name`
    pub fn option(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|e| e.effective.as_str())
    }

    /// Zero-based position of the effective value among the child options
    ///
    /// Empty when the item has no child option with that name.
    pub fn option_index(&self, name: &str) -> Option<String> {
        self.entries
            .get(name)
            .map(|e| e.index.map(|index| index.to_string()).unwrap_or_default())
    }

    /// Effective value, base64-decoded
    pub fn option_data(&self, name: &str) -> Option<String> {
        let effective = self.option(name)?;
        match decode_base64(effective) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(item = name, error = %err, "config item data is not valid base64");
                Some(String::new())
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// "Did you mean" hint naming declared items close to `name`
    pub fn suggest(&self, name: &str) -> Option<String> {
        let declared: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        suggest_item_name(name, &declared)
    }

    /// Full function table over this snapshot, static functions included
    pub fn into_functions(self) -> FunctionTable {
        let lookup = Arc::new(self);
        let mut table = FunctionTable::with_static_functions();

        let l = Arc::clone(&lookup);
        table.insert("ConfigOption", move |args: &[Value]| {
            let name = string_arg("ConfigOption", args, 0)?;
            Ok(Value::from(or_unknown(&l, &name, l.option(&name).map(String::from))))
        });

        let l = Arc::clone(&lookup);
        table.insert("ConfigOptionIndex", move |args: &[Value]| {
            let name = string_arg("ConfigOptionIndex", args, 0)?;
            Ok(Value::from(or_unknown(&l, &name, l.option_index(&name))))
        });

        let l = Arc::clone(&lookup);
        table.insert("ConfigOptionData", move |args: &[Value]| {
            let name = string_arg("ConfigOptionData", args, 0)?;
            Ok(Value::from(or_unknown(&l, &name, l.option_data(&name))))
        });

        let l = Arc::clone(&lookup);
        table.insert("ConfigOptionEquals", move |args: &[Value]| {
            let name = string_arg("ConfigOptionEquals", args, 0)?;
            let expected = string_arg("ConfigOptionEquals", args, 1)?;
            Ok(Value::from(compare(&l, &name, |actual| actual == expected)))
        });

        let l = lookup;
        table.insert("ConfigOptionNotEquals", move |args: &[Value]| {
            let name = string_arg("ConfigOptionNotEquals", args, 0)?;
            let expected = string_arg("ConfigOptionNotEquals", args, 1)?;
            Ok(Value::from(compare(&l, &name, |actual| actual != expected)))
        });

        table
    }
}

fn or_unknown(lookup: &ConfigLookup, name: &str, found: Option<String>) -> String {
    found.unwrap_or_else(|| {
        warn!(
            item = name,
            suggestion = %lookup.suggest(name).unwrap_or_default(),
            "lookup of unknown config item"
        );
        String::new()
    })
}

/// Unknown items compare false both ways
fn compare(lookup: &ConfigLookup, name: &str, test: impl Fn(&str) -> bool) -> bool {
    match lookup.option(name) {
        Some(actual) => test(actual),
        None => {
            warn!(
                item = name,
                suggestion = %lookup.suggest(name).unwrap_or_default(),
                "comparison against unknown config item"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vessel_core::{ConfigChildItem, ConfigGroup, ConfigItem, ItemType};

    fn select(name: &str, default: &str, options: &[&str]) -> ConfigItem {
        let mut item = ConfigItem::new(name, default, "");
        item.item_type = ItemType::SelectOne;
        item.items = options
            .iter()
            .map(|o| ConfigChildItem {
                name: o.to_string(),
                ..Default::default()
            })
            .collect();
        item
    }

    fn schema() -> Config {
        Config::new("test").with_group(
            ConfigGroup::new("main")
                .with_item(ConfigItem::new("plain", "fallback", ""))
                .with_item(ConfigItem::new("overridden", "fallback", "set"))
                .with_item(select("db", "external", &["embedded", "external"]))
                .with_item(ConfigItem::new("cert", "aGVsbG8=", ""))
                .with_item(ConfigItem::new("bad_cert", "%%%", "")),
        )
    }

    fn call(table: &FunctionTable, name: &str, args: &[&str]) -> Value {
        let args: Vec<Value> = args.iter().map(|a| Value::from(*a)).collect();
        table.call(name, &args).unwrap()
    }

    #[test]
    fn test_raw_fallback() {
        let lookup = ConfigLookup::new(&schema(), &IndexMap::new());
        assert_eq!(lookup.option("plain"), Some("fallback"));
        assert_eq!(lookup.option("overridden"), Some("set"));
        assert_eq!(lookup.option("missing"), None);
    }

    #[test]
    fn test_resolved_value_wins() {
        let mut resolved = IndexMap::new();
        resolved.insert(
            "plain".to_string(),
            ResolvedValue {
                default: "rendered".to_string(),
                value: String::new(),
            },
        );
        let lookup = ConfigLookup::new(&schema(), &resolved);
        assert_eq!(lookup.option("plain"), Some("rendered"));
    }

    #[test]
    fn test_option_index() {
        let lookup = ConfigLookup::new(&schema(), &IndexMap::new());
        assert_eq!(lookup.option_index("db").as_deref(), Some("1"));
        assert_eq!(lookup.option_index("plain").as_deref(), Some(""));
        assert_eq!(lookup.option_index("missing"), None);
    }

    #[test]
    fn test_option_data() {
        let lookup = ConfigLookup::new(&schema(), &IndexMap::new());
        assert_eq!(lookup.option_data("cert").as_deref(), Some("hello"));
        assert_eq!(lookup.option_data("bad_cert").as_deref(), Some(""));
    }

    #[test]
    fn test_function_table() {
        let table = ConfigLookup::new(&schema(), &IndexMap::new()).into_functions();

        assert_eq!(call(&table, "ConfigOption", &["overridden"]).as_str(), Some("set"));
        assert_eq!(call(&table, "ConfigOption", &["missing"]).as_str(), Some(""));
        assert_eq!(call(&table, "ConfigOptionIndex", &["db"]).as_str(), Some("1"));
        assert_eq!(call(&table, "ConfigOptionData", &["cert"]).as_str(), Some("hello"));
        assert!(call(&table, "ConfigOptionEquals", &["db", "external"]).is_true());
        assert!(!call(&table, "ConfigOptionNotEquals", &["db", "external"]).is_true());
        assert!(!call(&table, "ConfigOptionEquals", &["missing", ""]).is_true());
        assert!(!call(&table, "ConfigOptionNotEquals", &["missing", "x"]).is_true());
        assert!(table.contains("Base64Encode"));
    }

    #[test]
    fn test_index_without_matching_option() {
        let lookup = ConfigLookup::new(&schema(), &IndexMap::new());
        assert_eq!(lookup.option_index("db").as_deref(), Some("1"));
        assert_eq!(lookup.option_index("plain").as_deref(), Some(""));
        assert_eq!(lookup.option_index("missing"), None);
    }

    #[test]
    fn test_suggests_declared_items() {
        let lookup = ConfigLookup::new(&schema(), &IndexMap::new());
        assert!(lookup.suggest("plian").unwrap().contains("plain"));
        assert!(lookup.suggest("zzzzzzzz").is_none());
    }

    #[test]
    fn test_equals_requires_expected() {
        let table = ConfigLookup::new(&schema(), &IndexMap::new()).into_functions();
        let err = table
            .call("ConfigOptionEquals", &[Value::from("db")])
            .unwrap_err();
        assert_eq!(err.kind(), minijinja::ErrorKind::MissingArgument);
    }
}
