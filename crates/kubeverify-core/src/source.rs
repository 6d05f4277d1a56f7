//! # External Collaborators
//!
//! The verifier does not fetch images, check signatures, talk to the API
//! server or read attestations itself. Those concerns live behind the traits
//! in this module so each can be backed by a real client in production and
//! by a stub in tests.
//!
//! | Trait | Called | Per verification |
//! |-------|--------|------------------|
//! | [`ManifestSource`] | fetch candidate manifests + signature ref | once |
//! | [`AdmissionSimulator`] | dry-run create / apply patch | 0-2 per candidate |
//! | [`SignatureVerifier`] | verify the signature | once |
//! | [`ProvenanceSource`] | attestation / SBOM lookup | 0-1 |
//!
//! All traits are `Send + Sync` so one verifier can serve concurrent calls.
//! Timeouts and retries belong to the implementations.

use std::path::Path;

use crate::error::ExternalError;
use crate::option::AnnotationConfig;
use crate::resource::Resource;
use crate::verdict::Provenance;

/// Inputs for a manifest fetch.
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    /// Canonical YAML form of the live object.
    pub object_bytes: &'a [u8],
    /// Resolved manifest image reference, if any.
    pub image_ref: Option<&'a str>,
    /// Reference to a resource carrying the signed manifest.
    pub signature_resource_ref: Option<&'a str>,
    /// Annotation naming scheme.
    pub annotations: &'a AnnotationConfig,
    /// Ignore fields resolved for this object.
    pub ignore_fields: &'a [String],
    /// Maximum number of candidates to return.
    pub max_candidates: usize,
}

/// Candidate manifests for one object, in the order they should be tried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedManifests {
    /// Serialized candidate documents.
    pub candidates: Vec<Vec<u8>>,
    /// Reference to the signature covering the candidates.
    pub signature_ref: String,
}

/// Retrieves signed reference manifests.
pub trait ManifestSource: Send + Sync {
    /// Returns the candidate manifests for the object in `request`.
    ///
    /// # Errors
    ///
    /// Any failure aborts the verification.
    fn fetch(&self, request: &FetchRequest<'_>) -> Result<FetchedManifests, ExternalError>;
}

/// Inputs for a signature check.
#[derive(Debug, Clone, Copy)]
pub struct SignatureRequest<'a> {
    /// Canonical YAML form of the live object.
    pub object_bytes: &'a [u8],
    /// Signature reference returned by the manifest source.
    pub signature_ref: &'a str,
    /// Key material, if keyed verification is configured.
    pub key_path: Option<&'a Path>,
    /// Annotation naming scheme.
    pub annotations: &'a AnnotationConfig,
}

/// Outcome of a signature check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureCheck {
    /// Whether the signature is cryptographically valid.
    pub valid: bool,
    /// Signer identity (email, subject or key id).
    pub signer: String,
    /// Signing time as seconds since the Unix epoch, if known.
    pub signed_at: Option<i64>,
}

/// Checks signatures over manifests.
pub trait SignatureVerifier: Send + Sync {
    /// Verifies the signature referenced by `request`.
    ///
    /// An invalid signature is `Ok` with `valid: false`; `Err` means the
    /// check itself could not run.
    ///
    /// # Errors
    ///
    /// Any failure aborts the verification.
    fn verify(&self, request: &SignatureRequest<'_>) -> Result<SignatureCheck, ExternalError>;
}

/// Result of computing an apply patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyPatch {
    /// The patch that would be sent to the server.
    pub patch: Vec<u8>,
    /// The object as it would look after the patch is applied.
    pub patched: Vec<u8>,
}

/// Server-side admission simulation.
pub trait AdmissionSimulator: Send + Sync {
    /// Performs a dry-run create of `object` and returns the object the
    /// server would have stored. `namespace` is `None` for cluster-scoped
    /// objects.
    ///
    /// # Errors
    ///
    /// Transport or admission failures.
    fn dry_run_create(&self, object: &[u8], namespace: Option<&str>) -> Result<Vec<u8>, ExternalError>;

    /// Computes the result of applying `manifest` to the current object in
    /// `namespace`.
    ///
    /// # Errors
    ///
    /// Transport failures or an unpatchable manifest.
    fn apply_patch(&self, manifest: &[u8], namespace: &str) -> Result<ApplyPatch, ExternalError>;
}

/// Inputs for a provenance lookup.
#[derive(Debug, Clone, Copy)]
pub struct ProvenanceRequest<'a> {
    /// The verified object.
    pub resource: &'a Resource,
    /// Signature reference returned by the manifest source.
    pub signature_ref: &'a str,
    /// Explicit provenance resource reference.
    pub provenance_resource_ref: Option<&'a str>,
}

/// Retrieves build provenance for a signed artifact.
pub trait ProvenanceSource: Send + Sync {
    /// Returns the provenance records for `request`.
    ///
    /// # Errors
    ///
    /// Any failure aborts the verification.
    fn get(&self, request: &ProvenanceRequest<'_>) -> Result<Vec<Provenance>, ExternalError>;
}

/// Provenance source that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProvenance;

impl ProvenanceSource for NoProvenance {
    fn get(&self, _request: &ProvenanceRequest<'_>) -> Result<Vec<Provenance>, ExternalError> {
        Ok(Vec::new())
    }
}
