//! Graph command - show discovered dependencies and resolution batches

use console::style;
use miette::IntoDiagnostic;
use serde::Serialize;
use std::path::Path;
use vessel_engine::{DependencyGraph, EngineError, Resolver};

use crate::error::Result;

#[derive(Serialize)]
struct GraphOutput<'a> {
    dependencies: Vec<NodeOutput<'a>>,
    batches: Vec<Vec<String>>,
}

#[derive(Serialize)]
struct NodeOutput<'a> {
    name: &'a str,
    depends_on: Vec<&'a str>,
}

fn nodes(graph: &DependencyGraph) -> Vec<NodeOutput<'_>> {
    graph
        .nodes()
        .map(|name| NodeOutput {
            name,
            depends_on: graph
                .dependencies_of(name)
                .map(|deps| deps.collect())
                .unwrap_or_default(),
        })
        .collect()
}

pub fn run(config_path: &Path, values_path: Option<&Path>, output_json: bool) -> Result<()> {
    let config = super::load_config(config_path, values_path)?;
    config.validate()?;

    let graph = Resolver::new().discover(&config);
    let order = graph.resolution_order();

    if output_json {
        let output = GraphOutput {
            dependencies: nodes(&graph),
            batches: order.as_ref().cloned().unwrap_or_default(),
        };
        println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
        return order.map(|_| ()).map_err(|cycle| EngineError::from(cycle).into());
    }

    println!("{}", style("Dependencies").bold());
    for node in nodes(&graph) {
        if node.depends_on.is_empty() {
            println!("  {}", node.name);
        } else {
            println!(
                "  {} {} {}",
                node.name,
                style("->").dim(),
                node.depends_on.join(", ")
            );
        }
    }

    let batches = order.map_err(EngineError::from)?;

    println!();
    println!("{}", style("Resolution order").bold());
    for (index, batch) in batches.iter().enumerate() {
        println!("  {}. {}", index + 1, batch.join(", "));
    }

    Ok(())
}
