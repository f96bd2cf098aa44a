//! Redact commands - manage stored support-bundle redaction rules

use console::style;
use miette::IntoDiagnostic;
use std::path::Path;
use tracing::debug;
use vessel_kube::{ConfigMapStore, FileStore, KeyValueStore, RedactUpdate, RedactorService};

use crate::error::Result;

/// Open the redactor store: a local file when given, otherwise the ConfigMap
pub async fn open_service(
    namespace: &str,
    store_file: Option<&Path>,
) -> Result<RedactorService<Box<dyn KeyValueStore>>> {
    let store: Box<dyn KeyValueStore> = match store_file {
        Some(path) => {
            debug!(path = %path.display(), "using file store");
            Box::new(FileStore::new(path)?)
        }
        None => {
            debug!(namespace, "using configmap store");
            Box::new(ConfigMapStore::new(namespace).await?)
        }
    };

    Ok(RedactorService::new(store))
}

pub async fn list<S: KeyValueStore>(service: &RedactorService<S>, output_json: bool) -> Result<()> {
    let redactors = service.list().await?;

    if output_json {
        println!("{}", serde_json::to_string_pretty(&redactors).into_diagnostic()?);
        return Ok(());
    }

    if redactors.is_empty() {
        println!("No redactors found");
        return Ok(());
    }

    println!(
        "{:<28} {:<28} {:<9} {}",
        style("SLUG").bold(),
        style("NAME").bold(),
        style("ENABLED").bold(),
        style("UPDATED").bold()
    );

    for info in &redactors {
        let enabled = if info.enabled {
            style("yes").green()
        } else {
            style("no").dim()
        };
        println!(
            "{:<28} {:<28} {:<9} {}",
            info.slug,
            info.name,
            enabled,
            info.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}

pub async fn get<S: KeyValueStore>(service: &RedactorService<S>, slug: &str) -> Result<()> {
    let entry = service.get_by_slug(slug).await?;
    let yaml = serde_yaml::to_string(&entry.redact).into_diagnostic()?;
    print!("{}", yaml);
    Ok(())
}

pub async fn set<S: KeyValueStore>(
    service: &RedactorService<S>,
    file: &Path,
    update: RedactUpdate,
) -> Result<()> {
    let yaml = std::fs::read_to_string(file)?;
    let is_new = update.is_new;
    let entry = service.set_redact_yaml(update, &yaml).await?;

    let verb = if is_new { "Created" } else { "Saved" };
    println!(
        "{} {} redactor {}",
        style("✓").green().bold(),
        verb,
        style(&entry.metadata.slug).cyan()
    );
    Ok(())
}

pub async fn delete<S: KeyValueStore>(service: &RedactorService<S>, slug: &str) -> Result<()> {
    service.delete(slug).await?;
    println!("{} Deleted redactor {}", style("✓").green().bold(), style(slug).cyan());
    Ok(())
}

/// Print the combined document, or replace rules from one when `set` is given
pub async fn spec<S: KeyValueStore>(service: &RedactorService<S>, set: Option<&Path>) -> Result<()> {
    if let Some(path) = set {
        let yaml = std::fs::read_to_string(path)?;
        service.set_spec(&yaml).await?;
        println!("{} Updated redactor spec", style("✓").green().bold());
        return Ok(());
    }

    print!("{}", service.spec_yaml().await?);
    Ok(())
}
