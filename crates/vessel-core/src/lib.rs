//! Vessel Core - Configuration schema types
//!
//! This crate provides the foundational types used throughout Vessel:
//! - `Config`: The vendor-defined configuration schema (groups of items)
//! - `ConfigItem`: A named setting whose default and value are templates
//! - `ConfigValues`: User-supplied overrides applied before rendering

pub mod config;
pub mod error;
pub mod values;

pub use config::{Config, ConfigChildItem, ConfigGroup, ConfigItem, ConfigMetadata, ConfigSpec, ItemType};
pub use error::{CoreError, Result};
pub use values::{ConfigValue, ConfigValues};
