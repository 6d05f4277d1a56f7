//! # Kubeverify Core
//!
//! Verifies that a live Kubernetes object is the admitted form of a signed
//! reference manifest, that the signature is valid, and that the signer is
//! trusted.
//!
//! ## Threat Coverage
//!
//! | Threat | Stage | Detection |
//! |--------|-------|-----------|
//! | Unsigned object applied to the cluster | Fetch | No candidate manifest |
//! | Post-signing tampering | Matching | Non-empty filtered diff |
//! | Forged or stale signature | Signature | Verifier reports invalid |
//! | Signature by an untrusted identity | Signer allowlist | Signer not matched |
//!
//! Drift the cluster introduces legitimately (defaulting, mutating webhooks,
//! apply merges) is absorbed by the dry-run tiers of the matcher and by the
//! ignore-field policy.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       KUBEVERIFY CORE                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │                  ┌──────────────────────┐                       │
//! │                  │   ResourceVerifier   │  ← Facade             │
//! │                  └──────────┬───────────┘                       │
//! │                             │                                   │
//! │      ┌──────────────┬───────┴───────┬──────────────┐            │
//! │      ▼              ▼               ▼              ▼            │
//! │ ┌──────────┐  ┌───────────┐  ┌────────────┐  ┌────────────┐     │
//! │ │ Manifest │  │ Manifest  │  │ Signature  │  │ Provenance │     │
//! │ │  Source  │  │  Matcher  │  │  Verifier  │  │   Source   │     │
//! │ └──────────┘  └─────┬─────┘  └────────────┘  └────────────┘     │
//! │                     ▼                                           │
//! │              ┌─────────────┐                                    │
//! │              │  Admission  │                                    │
//! │              │  Simulator  │                                    │
//! │              └─────────────┘                                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kubeverify_core::{Resource, ResourceVerifier, VerifyResourceOption};
//!
//! let verifier = ResourceVerifier::new(manifests, signatures, simulator);
//! let option = VerifyResourceOption::load("verify.yaml")?;
//!
//! let resource = Resource::from_yaml_bytes(&live_object)?;
//! let verdict = verifier.verify_resource(&resource, &option)?;
//! println!("{}", verdict);
//! ```
//!
//! ## Notes
//!
//! - Verification is synchronous; candidates are tried strictly in order
//! - A mismatch, an invalid signature or an untrusted signer is a verdict,
//!   not an error
//! - The option is never mutated; the effective ignore-field policy is
//!   derived per call
//! - No subscriber is installed; events go through `tracing`

pub mod bundle;
mod error;
pub mod images;
pub mod matcher;
pub mod option;
pub mod policy;
mod resource;
pub mod source;
mod verdict;
mod verify;

pub use bundle::BundleManifestSource;
pub use error::{ConfigError, ExternalError, ImageError, MatchError, ResourceError, VerifyError};
pub use images::{container_images, ImageObject};
pub use matcher::{mask_paths, ManifestMatcher, MatchOutcome, MatchReport, MatchSettings, MatchTier, TierAttempt};
pub use option::{AnnotationConfig, VerifyResourceOption};
pub use policy::{ObjectFieldBinding, ObjectFieldBindingList, ObjectReference, ObjectReferenceList, SignerList};
pub use resource::{Resource, CRD_KIND};
pub use source::{
    AdmissionSimulator, ApplyPatch, FetchRequest, FetchedManifests, ManifestSource, NoProvenance, ProvenanceRequest,
    ProvenanceSource, SignatureCheck, SignatureRequest, SignatureVerifier,
};
pub use verdict::{Provenance, VerifyResourceResult};
pub use verify::ResourceVerifier;

// Re-export the tree types that appear in verdicts.
pub use kubeverify_mapnode::{DiffResult, Difference, Node};

/// Core result type for verification.
pub type Result<T> = std::result::Result<T, VerifyError>;

#[cfg(test)]
mod tests;
