//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Config not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Invalid config document: {message}")]
    InvalidConfig { message: String },

    #[error("Config item in group '{group}' has an empty name")]
    EmptyItemName { group: String },

    #[error("Duplicate config item '{name}' (declared in group '{first_group}' and again in '{second_group}')")]
    DuplicateItem {
        name: String,
        first_group: String,
        second_group: String,
    },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
