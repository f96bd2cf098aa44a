//! Dependency-ordered resolution of config item templates
//!
//! The resolver runs the discovery pass, then repeatedly takes every head
//! node of a copy of the graph, renders those items against a snapshot of
//! the values resolved so far, stores the whole batch and removes it from
//! the graph. It stops when the graph is empty or no node is ready.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;
use vessel_core::{Config, ConfigItem};

use crate::depgraph::DependencyGraph;
use crate::discovery;
use crate::error::{EngineError, ItemField, Result};
use crate::functions::FunctionTable;
use crate::lookup::ConfigLookup;
use crate::renderer::{Render, TemplateRenderer};

/// Rendered templates of one item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedValue {
    pub default: String,
    pub value: String,
}

impl ResolvedValue {
    /// `value` when non-empty, otherwise `default`
    pub fn effective(&self) -> &str {
        if self.value.is_empty() {
            &self.default
        } else {
            &self.value
        }
    }
}

/// Output of a resolution run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolvedConfig {
    /// Rendered values in declaration order
    pub values: IndexMap<String, ResolvedValue>,

    /// Item names per iteration, in the order they were rendered
    pub batches: Vec<Vec<String>>,

    /// Graph as discovered, before resolution consumed its copy
    #[serde(skip)]
    pub graph: DependencyGraph,
}

impl ResolvedConfig {
    pub fn get(&self, name: &str) -> Option<&ResolvedValue> {
        self.values.get(name)
    }

    /// Effective rendered value of `name`
    pub fn effective(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(ResolvedValue::effective)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy of `config` with each resolved item's templates replaced by
    /// their rendered output
    pub fn apply_to(&self, config: &Config) -> Config {
        let mut rendered = config.clone();
        for item in rendered.items_mut() {
            if let Some(resolved) = self.values.get(&item.name) {
                item.default = resolved.default.clone();
                item.value = resolved.value.clone();
            }
        }
        rendered
    }
}

/// Partial result plus the error that stopped resolution, if any
#[derive(Debug)]
pub struct ResolutionReport {
    pub resolved: ResolvedConfig,
    pub error: Option<EngineError>,
}

impl ResolutionReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<ResolvedConfig> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.resolved),
        }
    }
}

/// Resolver settings
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    strict: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverOptions {
    pub fn new() -> Self {
        Self { strict: true }
    }

    /// Fail on undefined template variables (default: on)
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn build(self) -> Resolver {
        Resolver::with_renderer(TemplateRenderer::builder().strict(self.strict).build())
    }
}

/// Runs discovery and resolution over a schema
pub struct Resolver<R = TemplateRenderer> {
    renderer: R,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        ResolverOptions::new().build()
    }

    pub fn options() -> ResolverOptions {
        ResolverOptions::new()
    }
}

impl<R: Render> Resolver<R> {
    /// Use a custom rendering primitive
    pub fn with_renderer(renderer: R) -> Self {
        Self { renderer }
    }

    /// Run the discovery pass only
    pub fn discover(&self, config: &Config) -> DependencyGraph {
        discovery::discover(config, &self.renderer)
    }

    /// Render every item in dependency order
    pub fn resolve(&self, config: &Config) -> Result<ResolvedConfig> {
        self.resolve_with_report(config).into_result()
    }

    /// Render every item, keeping what was resolved before a failure
    pub fn resolve_with_report(&self, config: &Config) -> ResolutionReport {
        if let Err(err) = config.validate() {
            return ResolutionReport {
                resolved: ResolvedConfig::default(),
                error: Some(err.into()),
            };
        }

        let graph = self.discover(config);
        self.resolve_graph(config, &graph)
    }

    /// Resolve `config` along an already discovered graph
    ///
    /// The graph is copied; the caller's graph is left untouched and is
    /// stored in the result.
    pub fn resolve_graph(&self, config: &Config, graph: &DependencyGraph) -> ResolutionReport {
        let items: IndexMap<&str, &ConfigItem> =
            config.items().map(|item| (item.name.as_str(), item)).collect();

        let mut pending = graph.copy();
        let mut resolved: IndexMap<String, ResolvedValue> = IndexMap::new();
        let mut batches: Vec<Vec<String>> = Vec::new();

        let error = loop {
            if pending.is_empty() {
                break None;
            }

            let heads = match pending.head_nodes() {
                Ok(heads) => heads,
                Err(cycle) => break Some(EngineError::from(cycle)),
            };
            debug!(iteration = batches.len(), items = ?heads, "resolving batch");

            let functions = ConfigLookup::new(config, &resolved).into_functions();
            let rendered = match self.render_batch(&heads, &items, &functions) {
                Ok(rendered) => rendered,
                Err(err) => break Some(err),
            };

            resolved.extend(rendered);
            for name in &heads {
                pending.resolve_dep(name);
            }
            batches.push(heads);
        };

        ResolutionReport {
            resolved: ResolvedConfig {
                values: declaration_order(&items, resolved),
                batches,
                graph: graph.copy(),
            },
            error,
        }
    }

    /// Render every head node before any result is stored
    fn render_batch(
        &self,
        heads: &[String],
        items: &IndexMap<&str, &ConfigItem>,
        functions: &FunctionTable,
    ) -> Result<Vec<(String, ResolvedValue)>> {
        heads
            .iter()
            .map(|name| {
                let item = items
                    .get(name.as_str())
                    .ok_or_else(|| EngineError::UnknownItem { name: name.clone() })?;
                Ok((name.clone(), self.render_item(item, functions)?))
            })
            .collect()
    }

    fn render_item(&self, item: &ConfigItem, functions: &FunctionTable) -> Result<ResolvedValue> {
        Ok(ResolvedValue {
            default: self.render_field(item, ItemField::Default, &item.default, functions)?,
            value: self.render_field(item, ItemField::Value, &item.value, functions)?,
        })
    }

    fn render_field(
        &self,
        item: &ConfigItem,
        field: ItemField,
        template: &str,
        functions: &FunctionTable,
    ) -> Result<String> {
        self.renderer
            .render(&field.template_name(&item.name), template, functions)
            .map_err(|source| EngineError::ItemRender {
                item: item.name.clone(),
                field,
                source,
            })
    }
}

fn declaration_order(
    items: &IndexMap<&str, &ConfigItem>,
    mut resolved: IndexMap<String, ResolvedValue>,
) -> IndexMap<String, ResolvedValue> {
    items
        .keys()
        .filter_map(|name| resolved.shift_remove_entry(*name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateError;
    use std::cell::RefCell;
    use vessel_core::{ConfigGroup, ConfigValues};

    fn config(items: Vec<ConfigItem>) -> Config {
        let group = items
            .into_iter()
            .fold(ConfigGroup::new("main"), |group, item| group.with_item(item));
        Config::new("test").with_group(group)
    }

    #[test]
    fn test_acyclic_end_to_end() {
        let cfg = config(vec![
            ConfigItem::new("A", "1", ""),
            ConfigItem::new("B", r#"{{ ConfigOption("A") }}x"#, ""),
            ConfigItem::new("C", r#"{{ ConfigOptionEquals("A", "1") }}"#, ""),
        ]);

        let resolved = Resolver::new().resolve(&cfg).unwrap();

        assert_eq!(resolved.effective("A"), Some("1"));
        assert_eq!(resolved.effective("B"), Some("1x"));
        assert_eq!(resolved.effective("C"), Some("true"));
        assert_eq!(
            resolved.batches,
            vec![vec!["A".to_string()], vec!["B".to_string(), "C".to_string()]]
        );
    }

    #[test]
    fn test_two_item_cycle() {
        let cfg = config(vec![
            ConfigItem::new("A", r#"{{ ConfigOption("B") }}"#, ""),
            ConfigItem::new("B", r#"{{ ConfigOption("A") }}"#, ""),
        ]);

        let report = Resolver::new().resolve_with_report(&cfg);

        assert!(report.resolved.is_empty());
        match report.error {
            Some(EngineError::DependencyCycle(cycle)) => {
                assert_eq!(cycle.blocked().collect::<Vec<_>>(), vec!["A", "B"]);
            }
            other => panic!("expected a dependency cycle, got {:?}", other),
        }

        // the discovered graph is intact
        assert_eq!(report.resolved.graph.len(), 2);
        assert_eq!(report.resolved.graph.edge_count(), 2);
    }

    #[test]
    fn test_cycle_keeps_prior_batches() {
        let cfg = config(vec![
            ConfigItem::new("root", "r", ""),
            ConfigItem::new("A", r#"{{ ConfigOption("root") }}{{ ConfigOption("B") }}"#, ""),
            ConfigItem::new("B", r#"{{ ConfigOption("A") }}"#, ""),
        ]);

        let report = Resolver::new().resolve_with_report(&cfg);

        assert_eq!(report.resolved.effective("root"), Some("r"));
        assert_eq!(report.resolved.len(), 1);
        let err = report.error.unwrap();
        insta::assert_snapshot!(
            err.to_string(),
            @r#"no config options exist with 0 dependencies - "A" depends on "B"; "B" depends on "A""#
        );
    }

    #[test]
    fn test_one_value_per_item_and_ordering() {
        let cfg = config(vec![
            ConfigItem::new("d", r#"{{ ConfigOption("b") }}+{{ ConfigOption("c") }}"#, ""),
            ConfigItem::new("c", r#"{{ ConfigOption("a") }}c"#, ""),
            ConfigItem::new("b", r#"{{ ConfigOption("a") }}b"#, ""),
            ConfigItem::new("a", "a", ""),
        ]);

        let resolved = Resolver::new().resolve(&cfg).unwrap();

        assert_eq!(resolved.len(), 4);
        assert_eq!(
            resolved.values.keys().collect::<Vec<_>>(),
            vec!["d", "c", "b", "a"]
        );
        assert_eq!(resolved.effective("d"), Some("ab+ac"));

        let position = |name: &str| {
            resolved
                .batches
                .iter()
                .position(|batch| batch.iter().any(|n| n == name))
                .unwrap()
        };
        assert!(position("a") < position("b"));
        assert!(position("a") < position("c"));
        assert!(position("b") < position("d"));
        assert!(position("c") < position("d"));
        assert!(resolved.batches.len() <= 4);
    }

    #[test]
    fn test_value_overrides_default() {
        let cfg = config(vec![
            ConfigItem::new("host", "localhost", "db.internal"),
            ConfigItem::new("url", r#"postgres://{{ ConfigOption("host") }}"#, ""),
        ]);

        let resolved = Resolver::new().resolve(&cfg).unwrap();
        assert_eq!(resolved.get("host").unwrap().default, "localhost");
        assert_eq!(resolved.effective("url"), Some("postgres://db.internal"));
    }

    #[test]
    fn test_render_error_names_item_and_field() {
        let cfg = config(vec![
            ConfigItem::new("a", "ok", ""),
            ConfigItem::new("b", r#"{{ ConfigOption("a") }}"#, r#"{{ ConfigOptoin("a") }}"#),
        ]);

        let report = Resolver::new().resolve_with_report(&cfg);
        assert_eq!(report.resolved.effective("a"), Some("ok"));

        match report.error {
            Some(EngineError::ItemRender { item, field, source }) => {
                assert_eq!(item, "b");
                assert_eq!(field, ItemField::Value);
                assert!(source.suggestion.unwrap().contains("ConfigOption"));
            }
            other => panic!("expected an item render error, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_batch_stores_nothing() {
        let cfg = config(vec![
            ConfigItem::new("a", "ok", ""),
            ConfigItem::new("b", r#"{{ ConfigOption("a") }}x"#, ""),
            ConfigItem::new("c", r#"{{ ConfigOption("a") }}"#, r#"{{ ConfigOptoin("a") }}"#),
        ]);

        let resolver = Resolver::new();
        assert_eq!(
            resolver.discover(&cfg).resolution_order().unwrap(),
            vec![vec!["a".to_string()], vec!["b".to_string(), "c".to_string()]]
        );

        let report = resolver.resolve_with_report(&cfg);

        assert_eq!(report.error.as_ref().and_then(EngineError::item), Some("c"));
        assert_eq!(report.resolved.effective("a"), Some("ok"));
        assert!(report.resolved.get("b").is_none());
        assert!(report.resolved.get("c").is_none());
        assert_eq!(report.resolved.batches, vec![vec!["a".to_string()]]);
    }

    #[test]
    fn test_undeclared_reference_blocks() {
        let cfg = config(vec![ConfigItem::new("x", r#"{{ ConfigOption("ghost") }}"#, "")]);

        let err = Resolver::new().resolve(&cfg).unwrap_err();
        assert!(matches!(err, EngineError::DependencyCycle(_)));
        assert!(err.to_string().contains(r#""x" depends on "ghost""#));
    }

    #[test]
    fn test_invalid_schema() {
        let cfg = config(vec![ConfigItem::new("x", "", ""), ConfigItem::new("x", "", "")]);
        let err = Resolver::new().resolve(&cfg).unwrap_err();
        assert!(matches!(err, EngineError::Schema(_)));
    }

    #[test]
    fn test_apply_to() {
        let mut cfg = config(vec![
            ConfigItem::new("a", "1", ""),
            ConfigItem::new("b", r#"{{ ConfigOption("a") }}0"#, ""),
        ]);
        cfg.apply_values(&ConfigValues::new("test").with_value("a", "2"));

        let resolved = Resolver::new().resolve(&cfg).unwrap();
        let rendered = resolved.apply_to(&cfg);

        assert_eq!(rendered.item("b").unwrap().default, "20");
        assert_eq!(cfg.item("b").unwrap().default, r#"{{ ConfigOption("a") }}0"#);
    }

    #[test]
    fn test_option_index_in_template() {
        let mut db = ConfigItem::new("db", "external", "");
        db.items = vec![
            vessel_core::ConfigChildItem {
                name: "embedded".to_string(),
                ..Default::default()
            },
            vessel_core::ConfigChildItem {
                name: "external".to_string(),
                ..Default::default()
            },
        ];
        let cfg = config(vec![
            db,
            ConfigItem::new("idx", r#"{{ ConfigOptionIndex("db") }}"#, ""),
        ]);

        let resolved = Resolver::new().resolve(&cfg).unwrap();
        assert_eq!(resolved.effective("idx"), Some("1"));
    }

    /// Records the order templates were rendered in
    struct TracingRenderer {
        inner: TemplateRenderer,
        seen: RefCell<Vec<String>>,
    }

    impl Render for TracingRenderer {
        fn render(
            &self,
            name: &str,
            template: &str,
            functions: &FunctionTable,
        ) -> std::result::Result<String, TemplateError> {
            self.seen.borrow_mut().push(name.to_string());
            self.inner.render(name, template, functions)
        }
    }

    #[test]
    fn test_custom_renderer() {
        let cfg = config(vec![
            ConfigItem::new("b", r#"{{ ConfigOption("a") }}"#, ""),
            ConfigItem::new("a", "1", ""),
        ]);
        let resolver = Resolver::with_renderer(TracingRenderer {
            inner: TemplateRenderer::default(),
            seen: RefCell::new(Vec::new()),
        });

        let graph = resolver.discover(&cfg);
        resolver.renderer.seen.borrow_mut().clear();
        let report = resolver.resolve_graph(&cfg, &graph);

        assert!(report.is_success());
        assert_eq!(
            resolver.renderer.seen.borrow().as_slice(),
            &["a.default", "a.value", "b.default", "b.value"]
        );
    }
}
