//! Dependency discovery pass
//!
//! Every item's `default` and `value` templates are rendered once with a
//! recording function table. The config lookup functions do not look
//! anything up; they note an edge from the item being rendered to the name
//! they were called with, and echo that name back.
//!
//! Rendering in this pass is expected to fail sometimes (an echoed name is
//! not valid base64, a comparison is meaningless, ...). Such failures are
//! logged at trace level and dropped. Edges recorded before the failure are
//! kept.
//!
//! Because the recording functions return a truthy string, only the branch
//! taken with that value is visited: a reference that sits exclusively in
//! an untaken `{% if %}` branch produces no edge.

use minijinja::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;
use vessel_core::Config;

use crate::depgraph::DependencyGraph;
use crate::error::ItemField;
use crate::functions::{FunctionTable, string_arg};
use crate::renderer::Render;

/// Functions that reference another config item by name
pub const CONFIG_FUNCTIONS: &[&str] = &[
    "ConfigOption",
    "ConfigOptionIndex",
    "ConfigOptionData",
    "ConfigOptionEquals",
    "ConfigOptionNotEquals",
];

type SharedGraph = Arc<Mutex<DependencyGraph>>;

fn lock(graph: &SharedGraph) -> MutexGuard<'_, DependencyGraph> {
    graph.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Build the recording table for `item`
///
/// Static functions stay available so templates that mix them with lookups
/// render as far as possible.
pub fn recording_functions(item: &str, graph: &Arc<Mutex<DependencyGraph>>) -> FunctionTable {
    let mut table = FunctionTable::with_static_functions();

    for &function in CONFIG_FUNCTIONS {
        let item = item.to_string();
        let graph = Arc::clone(graph);
        table.insert(function, move |args: &[Value]| {
            let referenced = string_arg(function, args, 0)?;
            lock(&graph).add_dep(&item, &referenced);
            Ok(Value::from(referenced))
        });
    }

    table
}

/// Build the dependency graph for every item in `config`
///
/// Never fails. Every item becomes a node, in declaration order.
pub fn discover<R: Render + ?Sized>(config: &Config, renderer: &R) -> DependencyGraph {
    let graph: SharedGraph = Arc::new(Mutex::new(DependencyGraph::new()));

    for item in config.items() {
        lock(&graph).add_node(&item.name);
        let functions = recording_functions(&item.name, &graph);

        for (field, template) in [
            (ItemField::Default, &item.default),
            (ItemField::Value, &item.value),
        ] {
            let name = field.template_name(&item.name);
            if let Err(err) = renderer.render(&name, template, &functions) {
                trace!(template = %name, error = %err, "ignoring render failure during discovery");
            }
        }
    }

    let graph = std::mem::take(&mut *lock(&graph));
    trace!(graph = %graph.debug_dump(), "discovered dependencies");
    graph
}
