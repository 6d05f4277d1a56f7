//! Error types for resource verification.
//!
//! Every stage of the pipeline has its own error so a caller can tell which
//! step failed. Note what is *not* an error: a manifest that does not match,
//! an invalid signature, or a signer outside the allowlist are all reported
//! as `verified: false` inside a successful verdict.

use std::path::PathBuf;

use kubeverify_mapnode::NodeError;
use thiserror::Error;

use crate::matcher::MatchTier;

/// Boxed error returned by external collaborators (manifest source,
/// signature verifier, admission simulator, provenance source).
pub type ExternalError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for [`ResourceVerifier::verify_resource`](crate::ResourceVerifier::verify_resource).
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The live object could not be serialized for downstream consumers.
    #[error("failed to serialize resource: {0}")]
    Resource(#[from] ResourceError),

    /// Candidate manifests or the signature reference could not be fetched.
    #[error("YAML manifest not found for this resource: {0}")]
    Fetch(String),

    /// A candidate could not be compared with the live object.
    #[error("error occurred during matching manifest: {0}")]
    Match(#[from] MatchError),

    /// The signature verifier failed to run.
    #[error("failed to verify signature: {0}")]
    Signature(String),

    /// Container images could not be extracted from the object.
    #[error("failed to get container images: {0}")]
    Images(#[from] ImageError),

    /// Provenance records could not be retrieved.
    #[error("failed to get provenance: {0}")]
    Provenance(String),
}

/// Errors raised by the three-tier matcher.
#[derive(Debug, Error)]
pub enum MatchError {
    /// A candidate manifest could not be parsed into a tree.
    #[error("failed to initialize manifest node: {0}")]
    ManifestNode(#[source] NodeError),

    /// The admission simulator returned bytes that are not a document.
    #[error("failed to initialize dry-run-generated object node during {tier} match: {source}")]
    SimulatedNode {
        /// Tier that produced the simulated object.
        tier: MatchTier,
        /// Parse failure.
        #[source]
        source: NodeError,
    },

    /// A masked manifest could not be re-encoded for the simulator.
    #[error("failed to encode manifest for {tier} match: {source}")]
    Encode {
        /// Tier being attempted.
        tier: MatchTier,
        /// Encoding failure.
        #[source]
        source: NodeError,
    },

    /// The dry-run create call failed.
    #[error("dry-run create failed during {tier} match: {message}")]
    DryRun {
        /// Tier being attempted.
        tier: MatchTier,
        /// Transport error message.
        message: String,
    },

    /// The apply-patch computation failed.
    #[error("error during getting applied bytes: {0}")]
    ApplyPatch(String),

    /// The apply-patch result is not a document.
    #[error("failed to initialize patched object node: {0}")]
    PatchedNode(#[source] NodeError),
}

/// Errors raised while constructing a [`Resource`](crate::Resource).
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Input bytes were not a valid document.
    #[error("parse error: {0}")]
    Parse(#[from] NodeError),

    /// The document is not a map.
    #[error("resource must be a map")]
    NotAnObject,

    /// The object could not be encoded.
    #[error("serialization error: {0}")]
    Serialize(String),
}

/// Errors raised by container image extraction.
#[derive(Debug, Error)]
pub enum ImageError {
    /// A container list is not a sequence.
    #[error("{path} is not a list")]
    NotAList {
        /// Dotted path of the offending field.
        path: String,
    },

    /// A container entry has no usable `image` field.
    #[error("container '{container}' at {path} has no image")]
    MissingImage {
        /// Dotted path of the container entry.
        path: String,
        /// Container name, empty if unnamed.
        container: String,
    },

    /// A container entry is not a map.
    #[error("{path} is not a container object")]
    NotAContainer {
        /// Dotted path of the offending entry.
        path: String,
    },
}

/// Errors raised while loading or validating a verify option.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid option document.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A field holds an unusable value.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Field name.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}
