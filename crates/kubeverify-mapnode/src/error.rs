//! Error types for tree construction and serialization.

use thiserror::Error;

/// Errors raised while building or serializing a [`Node`](crate::Node).
#[derive(Debug, Error)]
pub enum NodeError {
    /// Input was not valid JSON, or the tree could not be encoded as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input was not valid YAML, or the tree could not be encoded as YAML.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
