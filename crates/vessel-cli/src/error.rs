//! CLI error types with exit code handling
//!
//! Every command returns [`CliError`], which maps to a process exit code
//! and keeps the rich diagnostics of engine errors.

use miette::Diagnostic;
use thiserror::Error;
use vessel_core::CoreError;
use vessel_engine::EngineError;
use vessel_kube::KubeError;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Schema or values document is invalid
    #[error("Validation failed: {message}")]
    #[diagnostic(code(vessel::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Loading a document failed
    #[error(transparent)]
    #[diagnostic(code(vessel::cli::config))]
    Core(#[from] CoreError),

    /// Discovery or resolution failed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),

    /// Redactor store failure
    #[error(transparent)]
    #[diagnostic(code(vessel::cli::store))]
    Store(#[from] KubeError),

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(vessel::cli::io))]
    Io { message: String },

    /// Wrapped error for passthrough (stores the formatted message)
    #[error("{message}")]
    #[diagnostic(code(vessel::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Core(CoreError::Io(_)) => exit_codes::IO_ERROR,
            CliError::Core(_) => exit_codes::VALIDATION_ERROR,
            CliError::Engine(EngineError::DependencyCycle(_)) => exit_codes::DEPENDENCY_ERROR,
            CliError::Engine(EngineError::Schema(_)) => exit_codes::VALIDATION_ERROR,
            CliError::Engine(_) => exit_codes::TEMPLATE_ERROR,
            CliError::Store(_) => exit_codes::STORE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create a validation error with help text
    pub fn validation_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<miette::Report> for CliError {
    fn from(err: miette::Report) -> Self {
        CliError::Other {
            message: format!("{:?}", err),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use vessel_engine::DependencyCycle;

    #[test]
    fn test_exit_codes() {
        let cycle = CliError::from(EngineError::from(DependencyCycle {
            waiting: vec![("a".to_string(), vec!["a".to_string()])],
        }));
        assert_eq!(cycle.exit_code(), exit_codes::DEPENDENCY_ERROR);

        let missing = CliError::from(CoreError::ConfigNotFound {
            path: "x.yaml".to_string(),
        });
        assert_eq!(missing.exit_code(), exit_codes::VALIDATION_ERROR);

        let store = CliError::from(KubeError::RedactorNotFound {
            slug: "x".to_string(),
        });
        assert_eq!(store.exit_code(), exit_codes::STORE_ERROR);
    }
}
