//! Vessel Kube - cluster-native storage for auxiliary specs
//!
//! This crate provides:
//! - **Stores**: a string-keyed document store backed by a ConfigMap, a local
//!   JSON file, or memory
//! - **Redactors**: per-rule redaction specs with migration from the legacy
//!   combined document

pub mod error;
pub mod redact;
pub mod storage;

pub use error::{KubeError, Result};
pub use redact::{Redact, RedactUpdate, Redactor, RedactorEntry, RedactorInfo, RedactorService, slugify};
pub use storage::{ConfigMapStore, FileStore, KeyValueStore, MemoryStore, OperationCounts};
