//! Dependency graph between config items
//!
//! Nodes are item names; each node maps to the set of names it depends on.
//! A node whose set is empty is a *head node* and can be rendered now.
//! Edges may point at names that were never added as nodes: such a node
//! never becomes ready, which `head_nodes` reports the same way as a cycle.
//!
//! Iteration follows insertion order so batches and diagnostics are stable,
//! but callers must not rely on the order of nodes within one batch.

use indexmap::{IndexMap, IndexSet};

use crate::error::DependencyCycle;

/// Mutable dependency graph for one resolution run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    dependencies: IndexMap<String, IndexSet<String>>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure `name` exists as a node. No-op when already present.
    pub fn add_node(&mut self, name: &str) {
        if !self.dependencies.contains_key(name) {
            self.dependencies.insert(name.to_string(), IndexSet::new());
        }
    }

    /// Record that `source` depends on `dependency`
    ///
    /// `dependency` does not need to be a node. Repeated calls are idempotent.
    pub fn add_dep(&mut self, source: &str, dependency: &str) {
        self.add_node(source);
        if let Some(deps) = self.dependencies.get_mut(source) {
            deps.insert(dependency.to_string());
        }
    }

    /// Remove `name` from every dependency set, then remove the node itself
    pub fn resolve_dep(&mut self, name: &str) {
        for deps in self.dependencies.values_mut() {
            deps.shift_remove(name);
        }
        self.dependencies.shift_remove(name);
    }

    /// All nodes with no remaining dependencies
    ///
    /// Fails when nodes remain but none of them is ready, listing every
    /// remaining node with the names it is still waiting on.
    pub fn head_nodes(&self) -> Result<Vec<String>, DependencyCycle> {
        let heads: Vec<String> = self
            .dependencies
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(name, _)| name.clone())
            .collect();

        if heads.is_empty() && !self.dependencies.is_empty() {
            let waiting = self
                .dependencies
                .iter()
                .map(|(name, deps)| (name.clone(), deps.iter().cloned().collect()))
                .collect();
            return Err(DependencyCycle { waiting });
        }

        Ok(heads)
    }

    /// Deep copy with independent storage
    pub fn copy(&self) -> DependencyGraph {
        DependencyGraph {
            dependencies: self
                .dependencies
                .iter()
                .map(|(name, deps)| (name.clone(), deps.iter().cloned().collect()))
                .collect(),
        }
    }

    /// Batches in which the nodes would resolve, computed on a copy
    pub fn resolution_order(&self) -> Result<Vec<Vec<String>>, DependencyCycle> {
        let mut remaining = self.copy();
        let mut batches = Vec::new();

        while !remaining.is_empty() {
            let heads = remaining.head_nodes()?;
            for head in &heads {
                remaining.resolve_dep(head);
            }
            batches.push(heads);
        }

        Ok(batches)
    }

    /// Textual dump of the adjacency structure, for logs and errors
    pub fn debug_dump(&self) -> String {
        let entries: Vec<String> = self
            .dependencies
            .iter()
            .map(|(name, deps)| {
                let deps: Vec<String> = deps.iter().map(|d| format!("{:?}", d)).collect();
                format!("{:?}: [{}]", name, deps.join(", "))
            })
            .collect();
        format!("deps: {{{}}}", entries.join(", "))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }

    /// Names `name` is still waiting on
    pub fn dependencies_of(&self, name: &str) -> Option<impl Iterator<Item = &str>> {
        self.dependencies
            .get(name)
            .map(|deps| deps.iter().map(String::as_str))
    }

    /// Node names in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.dependencies.keys().map(String::as_str)
    }

    /// Number of edges across all nodes
    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(IndexSet::len).sum()
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}
