//! Error types for vessel-kube

use thiserror::Error;

/// Result type for vessel-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur while storing auxiliary specs
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Storage backend error
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored entry could not be parsed
    #[error("unable to parse key {key}: {message}")]
    MalformedEntry { key: String, message: String },

    /// Creating or renaming would overwrite another redactor
    #[error("refusing to use name '{name}' - slug {slug} already exists")]
    NameCollision { name: String, slug: String },

    #[error("redactor {slug} not found")]
    RedactorNotFound { slug: String },

    /// Redactor document is not usable
    #[error("invalid redactor: {0}")]
    InvalidRedactor(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for KubeError {
    fn from(e: serde_json::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for KubeError {
    fn from(e: serde_yaml::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl KubeError {
    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, KubeError::Api(kube::Error::Api(resp)) if resp.code == 404)
    }

    /// Check if this is a conflict error (409)
    pub fn is_conflict(&self) -> bool {
        matches!(self, KubeError::Api(kube::Error::Api(resp)) if resp.code == 409)
    }
}
