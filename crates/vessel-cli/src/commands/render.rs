//! Render command - resolve every config item in dependency order

use clap::ValueEnum;
use console::style;
use miette::IntoDiagnostic;
use std::path::Path;
use tracing::debug;
use vessel_engine::ResolverOptions;

use crate::error::Result;

/// Output format for rendered documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

pub fn run(
    config_path: &Path,
    values_path: Option<&Path>,
    output: OutputFormat,
    strict: bool,
    show_batches: bool,
) -> Result<()> {
    let config = super::load_config(config_path, values_path)?;
    debug!(items = config.item_count(), "loaded config schema");

    let resolver = ResolverOptions::new().strict(strict).build();
    let report = resolver.resolve_with_report(&config);

    if show_batches {
        for (index, batch) in report.resolved.batches.iter().enumerate() {
            eprintln!(
                "{} {}",
                style(format!("batch {}:", index + 1)).dim(),
                batch.join(", ")
            );
        }
    }

    if let Some(err) = report.error {
        if !report.resolved.is_empty() {
            eprintln!(
                "{} rendered {} of {} item(s) before failing",
                style("note:").blue(),
                report.resolved.len(),
                config.item_count()
            );
        }
        return Err(err.into());
    }

    let rendered = report.resolved.apply_to(&config);
    let text = match output {
        OutputFormat::Yaml => rendered.to_yaml()?,
        OutputFormat::Json => serde_json::to_string_pretty(&rendered).into_diagnostic()?,
    };
    println!("{}", text.trim_end());

    Ok(())
}
