//! Redaction rule documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// apiVersion of the combined redactor document consumed by support bundles
pub const REDACTOR_API_VERSION: &str = "troubleshoot.sh/v1beta2";

/// Kind of the combined redactor document
pub const REDACTOR_KIND: &str = "Redactor";

/// Store key of the legacy combined document, also the combined doc's name
pub const LEGACY_REDACT_KEY: &str = "vessel-redact";

/// One redaction rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redact {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "FileSelector::is_empty")]
    pub file_selector: FileSelector,

    #[serde(default, skip_serializing_if = "Removals::is_empty")]
    pub removals: Removals,
}

/// Files a rule applies to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSelector {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

impl FileSelector {
    pub fn is_empty(&self) -> bool {
        self.file.is_empty() && self.files.is_empty()
    }
}

/// What a rule removes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Removals {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regex: Vec<RegexRemoval>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub yaml_path: Vec<String>,
}

impl Removals {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.regex.is_empty() && self.yaml_path.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexRemoval {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub selector: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub redactor: String,
}

/// Combined document holding many rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redactor {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub metadata: RedactorObjectMeta,

    #[serde(default)]
    pub spec: RedactorSpec,
}

fn default_api_version() -> String {
    REDACTOR_API_VERSION.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactorObjectMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactorSpec {
    /// Null entries are tolerated and skipped
    #[serde(default)]
    pub redactors: Vec<Option<Redact>>,
}

impl Redactor {
    /// Empty combined document named after the legacy key
    pub fn new() -> Self {
        Self {
            api_version: default_api_version(),
            kind: REDACTOR_KIND.to_string(),
            metadata: RedactorObjectMeta {
                name: LEGACY_REDACT_KEY.to_string(),
            },
            spec: RedactorSpec::default(),
        }
    }

    /// Rules in document order, skipping null entries
    pub fn redactors(&self) -> impl Iterator<Item = &Redact> {
        self.spec.redactors.iter().flatten()
    }

    pub fn push(&mut self, redact: Redact) {
        self.spec.redactors.push(Some(redact));
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}

/// Bookkeeping stored next to each rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactorInfo {
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub enabled: bool,
    #[serde(default)]
    pub description: String,
}

/// Value stored under each slug
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactorEntry {
    pub metadata: RedactorInfo,
    pub redact: Redact,
}

/// Request to create or update one rule
#[derive(Debug, Clone, Default)]
pub struct RedactUpdate {
    /// Display name; overrides the name in the YAML when set
    pub name: String,
    /// Slug of the entry to update, or fallback slug for a new unnamed rule
    pub slug: String,
    pub description: String,
    pub enabled: bool,
    /// Always create a new entry, even if `slug` exists
    pub is_new: bool,
}
