//! The resource verification facade.
//!
//! [`ResourceVerifier`] is the entry point of the crate. It owns the external
//! collaborators and runs the full pipeline for one live object per call.

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::{
    error::VerifyError,
    images::container_images,
    matcher::{ManifestMatcher, MatchSettings},
    option::VerifyResourceOption,
    resource::Resource,
    source::{
        AdmissionSimulator, FetchRequest, ManifestSource, NoProvenance, ProvenanceRequest, ProvenanceSource,
        SignatureRequest, SignatureVerifier,
    },
    verdict::VerifyResourceResult,
    Result,
};

use kubeverify_mapnode::DiffResult;

/// Verifies live objects against signed manifests.
///
/// # Pipeline
///
/// 1. Skip check (exempt objects return an out-of-scope verdict untouched)
/// 2. Ignore-field resolution
/// 3. Manifest fetch
/// 4. Three-tier matching, candidate by candidate
/// 5. Signature verification and signer allowlist
/// 6. Container image and provenance enrichment
///
/// A mismatch, an invalid signature or an untrusted signer produce
/// `verified: false`. Collaborator failures abort the call with a
/// [`VerifyError`] naming the failed stage.
///
/// # Example
///
/// ```rust,ignore
/// let verifier = ResourceVerifier::new(manifests, signatures, simulator);
/// let option = VerifyResourceOption::new().with_signers(SignerList::new(["release@example.com"]));
///
/// let verdict = verifier.verify_resource(&resource, &option)?;
/// if !verdict.is_verified() {
///     reject(verdict.diff);
/// }
/// ```
pub struct ResourceVerifier {
    /// Candidate manifest retrieval.
    manifests: Box<dyn ManifestSource>,

    /// Signature checks.
    signatures: Box<dyn SignatureVerifier>,

    /// Dry-run create and apply simulation.
    simulator: Box<dyn AdmissionSimulator>,

    /// Provenance lookup, only consulted when the option asks for it.
    provenance: Box<dyn ProvenanceSource>,
}

impl ResourceVerifier {
    /// Create a verifier. Provenance lookups return nothing until a source is
    /// set with [`ResourceVerifier::with_provenance_source`].
    pub fn new(
        manifests: Box<dyn ManifestSource>,
        signatures: Box<dyn SignatureVerifier>,
        simulator: Box<dyn AdmissionSimulator>,
    ) -> Self {
        Self {
            manifests,
            signatures,
            simulator,
            provenance: Box::new(NoProvenance),
        }
    }

    pub fn with_provenance_source(mut self, provenance: Box<dyn ProvenanceSource>) -> Self {
        self.provenance = provenance;
        self
    }

    /// Verify `resource` under `option`.
    ///
    /// # Errors
    ///
    /// Returns an error if the object cannot be serialized, or the manifest
    /// fetch, matching, signature check, image extraction or provenance
    /// lookup fails. No partial verdict is returned.
    pub fn verify_resource(&self, resource: &Resource, option: &VerifyResourceOption) -> Result<VerifyResourceResult> {
        let target = resource.display_ref();
        debug!("Verifying resource: {}", target);

        let object_bytes = resource.to_yaml_bytes()?;
        let image_ref = option.resolve_image_ref(resource);

        if option.skip_objects.matches(resource) {
            debug!("{} matches a skip selector; out of scope", target);
            return Ok(VerifyResourceResult::out_of_scope());
        }

        let ignore_fields = option.effective_ignore_fields().matches(resource).unwrap_or_default();
        debug!("Ignore fields for {}: {:?}", target, ignore_fields);

        let fetched = self
            .manifests
            .fetch(&FetchRequest {
                object_bytes: &object_bytes,
                image_ref: image_ref.as_deref(),
                signature_resource_ref: option.signature_resource_ref.as_deref(),
                annotations: &option.annotation_config,
                ignore_fields: &ignore_fields,
                max_candidates: option.max_resource_manifest_num,
            })
            .map_err(|e| VerifyError::Fetch(e.to_string()))?;
        debug!(
            "Fetched {} candidate manifest(s) for {} (sigRef: {})",
            fetched.candidates.len(),
            target,
            fetched.signature_ref
        );

        let (matched, diff) = self.match_candidates(resource, &fetched.candidates, &ignore_fields, option)?;

        let check = self
            .signatures
            .verify(&SignatureRequest {
                object_bytes: &object_bytes,
                signature_ref: &fetched.signature_ref,
                key_path: option.key_path.as_deref(),
                annotations: &option.annotation_config,
            })
            .map_err(|e| VerifyError::Signature(e.to_string()))?;

        if !check.valid {
            warn!("Invalid signature for {} (sigRef: {})", target, fetched.signature_ref);
        }
        let signer_allowed = option.signers.matches(&check.signer);
        if check.valid && !signer_allowed {
            warn!("Signer '{}' is not allowed for {}", check.signer, target);
        }

        let signed_time = check
            .signed_at
            .map(OffsetDateTime::from_unix_timestamp)
            .transpose()
            .map_err(|e| VerifyError::Signature(e.to_string()))?;

        let verified = matched && check.valid && signer_allowed;

        let container_images = container_images(resource)?;

        let provenances = if option.provenance {
            self.provenance
                .get(&ProvenanceRequest {
                    resource,
                    signature_ref: &fetched.signature_ref,
                    provenance_resource_ref: option.provenance_resource_ref.as_deref(),
                })
                .map_err(|e| VerifyError::Provenance(e.to_string()))?
        } else {
            Vec::new()
        };

        info!(
            "Verification of {}: verified={} matched={} signer='{}'",
            target, verified, matched, check.signer
        );

        Ok(VerifyResourceResult {
            verified,
            in_scope: true,
            signer: check.signer,
            signed_time,
            sig_ref: fetched.signature_ref,
            diff,
            container_images,
            provenances,
        })
    }

    /// Try each candidate in order, stopping at the first match.
    ///
    /// Without a match the diff of the first candidate is returned.
    fn match_candidates(
        &self,
        resource: &Resource,
        candidates: &[Vec<u8>],
        ignore_fields: &[String],
        option: &VerifyResourceOption,
    ) -> Result<(bool, Option<DiffResult>)> {
        let matcher = ManifestMatcher::new(self.simulator.as_ref());
        let settings = MatchSettings {
            ignore_fields,
            dry_run_namespace: option.effective_dry_run_namespace(),
            allow_apply_simulation: option.check_dry_run_for_apply,
        };

        let mut diffs: Vec<Option<DiffResult>> = Vec::with_capacity(candidates.len());
        for (index, candidate) in candidates.iter().enumerate() {
            let report = matcher.match_manifest(resource, candidate, &settings)?;
            if report.matched() {
                debug!(
                    "Candidate {} matched {} at {} tier",
                    index,
                    resource.display_ref(),
                    report.last_tier()
                );
                return Ok((true, None));
            }
            debug!("Candidate {} did not match {}", index, resource.display_ref());
            diffs.push(report.into_outcome().into_diff());
        }

        Ok((false, diffs.into_iter().next().flatten()))
    }
}
