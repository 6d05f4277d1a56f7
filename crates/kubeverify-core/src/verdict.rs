//! Verdict types for resource verification.

use std::fmt;

use kubeverify_mapnode::DiffResult;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::images::ImageObject;

/// Build provenance attached to a signed artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    /// Artifact the record describes (image or manifest reference).
    pub artifact: String,
    /// Digest of the artifact.
    pub hash: String,
    /// In-toto attestation statement, if one was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attestation: Option<serde_json::Value>,
    /// Transparency log index of the attestation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attestation_log_index: Option<i64>,
    /// SBOM reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sbom: Option<String>,
}

/// The final verdict for one live resource.
///
/// `verified` holds only when the manifest matched, the signature is valid
/// and the signer is allowed. A skipped resource has `in_scope == false` and
/// every other field at its default.
///
/// The [`Display`](fmt::Display) form is the canonical JSON encoding:
///
/// ```json
/// {"verified":true,"inScope":true,"signer":"release@example.com",
///  "signedTime":"2024-05-01T12:00:00Z","sigRef":"registry/app.sig",
///  "diff":null,"containerImages":[]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResourceResult {
    /// Overall decision.
    pub verified: bool,
    /// False when the resource matched a skip selector.
    pub in_scope: bool,
    /// Signer identity reported by the signature verifier.
    pub signer: String,
    /// Signing time, absent when the verifier reported none.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub signed_time: Option<OffsetDateTime>,
    /// Signature reference returned by the manifest source.
    pub sig_ref: String,
    /// Diff against the first candidate when nothing matched.
    pub diff: Option<DiffResult>,
    /// Container images referenced by the resource.
    pub container_images: Vec<ImageObject>,
    /// Provenance records, when requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provenances: Vec<Provenance>,
}

impl VerifyResourceResult {
    /// Verdict for a resource exempted by a skip selector.
    pub fn out_of_scope() -> Self {
        Self::default()
    }

    /// True if the resource was verified.
    pub fn is_verified(&self) -> bool {
        self.verified
    }
}

impl fmt::Display for VerifyResourceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
