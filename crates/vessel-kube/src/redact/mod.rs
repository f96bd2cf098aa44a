//! Redaction rules stored one entry per slug
//!
//! Each rule lives under its own key as a JSON [`RedactorEntry`]. Older
//! installs kept every rule in one combined YAML document under
//! [`LEGACY_REDACT_KEY`]; [`RedactorService::list`] splits that document
//! into per-rule entries the first time it runs.

mod slug;
mod types;

pub use slug::slugify;
pub use types::{
    FileSelector, LEGACY_REDACT_KEY, REDACTOR_API_VERSION, REDACTOR_KIND, Redact, RedactUpdate,
    Redactor, RedactorEntry, RedactorInfo, RedactorObjectMeta, RedactorSpec, RegexRemoval,
    Removals,
};

use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::{KubeError, Result};
use crate::storage::KeyValueStore;

/// Manages redaction rules in a key-value store
pub struct RedactorService<S> {
    store: S,
}

impl<S: KeyValueStore> RedactorService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Split the legacy combined document into per-rule entries
    ///
    /// Returns whether a migration happened. Safe to call on every read.
    pub async fn migrate(&self) -> Result<bool> {
        let Some(combined) = self.store.get(LEGACY_REDACT_KEY).await? else {
            return Ok(false);
        };

        info!("running migration from combined {} doc", LEGACY_REDACT_KEY);
        let mut data = self.store.list_all().await?;
        let count = split_redactors(&combined, &mut data)?;
        self.store.replace_all(data).await?;

        info!(redactors = count, "migrated combined redact spec");
        Ok(true)
    }

    /// Metadata of every rule, ordered by slug
    pub async fn list(&self) -> Result<Vec<RedactorInfo>> {
        self.migrate().await?;

        self.store
            .list_all()
            .await?
            .iter()
            .map(|(key, value)| parse_entry(key, value).map(|entry| entry.metadata))
            .collect()
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<RedactorEntry> {
        let raw = self
            .store
            .get(slug)
            .await?
            .ok_or_else(|| KubeError::RedactorNotFound {
                slug: slug.to_string(),
            })?;
        parse_entry(slug, &raw)
    }

    /// Create or update one rule from its YAML
    ///
    /// A name given in `update` overrides the name inside the YAML. When the
    /// name of an existing rule changes, the entry moves to the new slug.
    /// Creating or renaming onto an existing slug fails.
    pub async fn set_redact_yaml(&self, update: RedactUpdate, yaml: &str) -> Result<RedactorEntry> {
        let mut spec: Redact = serde_yaml::from_str(yaml)
            .map_err(|e| KubeError::InvalidRedactor(format!("unable to parse redact yaml: {}", e)))?;

        let existing = if update.is_new {
            None
        } else {
            self.store.get(&update.slug).await?
        };

        let now = Utc::now();
        let mut slug = update.slug.clone();
        let mut replaced_slug = None;

        let mut entry = match existing {
            Some(raw) => {
                let mut entry = parse_entry(&slug, &raw)?;

                if !update.name.is_empty() {
                    spec.name = update.name.clone();
                }

                if !spec.name.is_empty() {
                    let target = slugify(&spec.name);
                    if target.is_empty() {
                        return Err(KubeError::InvalidRedactor(format!(
                            "name '{}' does not produce a usable slug",
                            spec.name
                        )));
                    }
                    if target != slug {
                        if self.store.contains(&target).await? {
                            return Err(KubeError::NameCollision {
                                name: spec.name.clone(),
                                slug: target,
                            });
                        }
                        debug!(from = %slug, to = %target, "renaming redactor");
                        replaced_slug = Some(std::mem::replace(&mut slug, target));
                        entry.metadata.slug = slug.clone();
                    }
                    entry.metadata.name = spec.name.clone();
                } else {
                    spec.name = slug.clone();
                    entry.metadata.name = slug.clone();
                }
                entry
            }
            None => {
                if !update.name.is_empty() {
                    spec.name = update.name.clone();
                }
                if spec.name.is_empty() {
                    spec.name = slug.clone();
                } else {
                    slug = slugify(&spec.name);
                }

                if slug.is_empty() {
                    return Err(KubeError::InvalidRedactor(format!(
                        "name '{}' does not produce a usable slug",
                        spec.name
                    )));
                }
                if self.store.contains(&slug).await? {
                    return Err(KubeError::NameCollision {
                        name: spec.name.clone(),
                        slug,
                    });
                }

                RedactorEntry {
                    metadata: RedactorInfo {
                        name: spec.name.clone(),
                        slug: slug.clone(),
                        created_at: now,
                        updated_at: now,
                        enabled: update.enabled,
                        description: String::new(),
                    },
                    redact: Redact::default(),
                }
            }
        };

        entry.metadata.enabled = update.enabled;
        entry.metadata.description = update.description;
        entry.metadata.updated_at = now;
        entry.redact = spec;

        self.store
            .put(&slug, &serde_json::to_string(&entry)?)
            .await?;
        if let Some(old) = replaced_slug {
            self.store.delete(&old).await?;
        }

        Ok(entry)
    }

    /// Remove a rule. Missing slugs are not an error.
    pub async fn delete(&self, slug: &str) -> Result<()> {
        if !self.store.delete(slug).await? {
            debug!(slug, "redactor already absent");
        }
        Ok(())
    }

    /// Store every rule of a combined document as its own entry
    ///
    /// Existing entries are kept; a rule whose slug is already taken is
    /// stored under a suffixed slug.
    pub async fn set_spec(&self, combined_yaml: &str) -> Result<()> {
        let mut data = self.store.list_all().await?;
        split_redactors(combined_yaml, &mut data)?;
        self.store.replace_all(data).await
    }

    /// Combined document of every enabled rule
    ///
    /// A legacy combined document still in the store contributes all of its
    /// rules.
    pub async fn full_spec(&self) -> Result<Redactor> {
        let mut full = Redactor::new();

        for (key, value) in self.store.list_all().await? {
            if key == LEGACY_REDACT_KEY {
                let legacy = parse_combined(&value)?;
                full.spec.redactors.extend(legacy.spec.redactors);
                continue;
            }

            let entry = parse_entry(&key, &value)?;
            if entry.metadata.enabled {
                full.push(entry.redact);
            }
        }

        Ok(full)
    }

    /// [`Self::full_spec`] as YAML
    pub async fn spec_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.full_spec().await?)?)
    }
}

fn parse_entry(key: &str, value: &str) -> Result<RedactorEntry> {
    serde_json::from_str(value).map_err(|e| KubeError::MalformedEntry {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn parse_combined(yaml: &str) -> Result<Redactor> {
    let doc: Redactor = serde_yaml::from_str(yaml)
        .map_err(|e| KubeError::InvalidRedactor(format!("deserialize combined redact spec: {}", e)))?;

    if doc.kind != REDACTOR_KIND {
        return Err(KubeError::InvalidRedactor(format!(
            "combined redact spec has kind '{}', expected '{}'",
            doc.kind, REDACTOR_KIND
        )));
    }
    Ok(doc)
}

/// Write one entry per rule of `combined` into `data` and drop the legacy key
///
/// Unnamed rules are named `redactor-<index>`, as are rules whose name
/// yields an empty slug. A slug already present in `data` or used by an
/// earlier rule gets a `-<n>` suffix. All split rules are enabled.
fn split_redactors(combined: &str, data: &mut BTreeMap<String, String>) -> Result<usize> {
    let doc = parse_combined(combined)?;
    let now = Utc::now();
    let mut count = 0;

    data.remove(LEGACY_REDACT_KEY);

    for (index, redact) in doc.spec.redactors.into_iter().enumerate() {
        let Some(mut redact) = redact else {
            continue;
        };

        if redact.name.is_empty() {
            redact.name = format!("redactor-{}", index);
        }

        let mut base = slugify(&redact.name);
        if base.is_empty() {
            base = format!("redactor-{}", index);
        }
        let slug = unique_slug(&base, data);

        let entry = RedactorEntry {
            metadata: RedactorInfo {
                name: redact.name.clone(),
                slug: slug.clone(),
                created_at: now,
                updated_at: now,
                enabled: true,
                description: String::new(),
            },
            redact,
        };

        data.insert(slug, serde_json::to_string(&entry)?);
        count += 1;
    }

    Ok(count)
}

/// `base`, or `base-<n>` with the smallest `n` not already a key of `data`
fn unique_slug(base: &str, data: &BTreeMap<String, String>) -> String {
    if !data.contains_key(base) {
        return base.to_string();
    }

    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !data.contains_key(candidate))
        .unwrap_or_else(|| base.to_string())
}
