//! In-process manifest source over a signed YAML bundle.
//!
//! Useful when the signed manifests were already pulled (for example from an
//! OCI artifact unpacked on disk) and only need to be paired with objects.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::ExternalError;
use crate::resource::Resource;
use crate::source::{FetchRequest, FetchedManifests, ManifestSource};

/// A multi-document YAML bundle and the signature that covers it.
#[derive(Debug, Clone)]
pub struct BundleManifestSource {
    bundle: Vec<u8>,
    signature_ref: String,
}

impl BundleManifestSource {
    pub fn new(bundle: impl Into<Vec<u8>>, signature_ref: impl Into<String>) -> Self {
        Self {
            bundle: bundle.into(),
            signature_ref: signature_ref.into(),
        }
    }

    /// Documents in the bundle that describe the same object as `object`.
    ///
    /// `kind` and `metadata.name` must be equal. A document that declares a
    /// namespace must declare the object's namespace.
    fn candidates_for(&self, object: &Resource, max: usize) -> Result<Vec<Vec<u8>>, ExternalError> {
        let mut candidates = Vec::new();
        for document in serde_yaml::Deserializer::from_slice(&self.bundle) {
            let value = Value::deserialize(document)?;
            if value.is_null() {
                continue;
            }
            let Ok(doc) = Resource::from_value(value) else {
                debug!("Skipping non-object document in bundle");
                continue;
            };

            let same_namespace = doc.namespace().is_empty() || doc.namespace() == object.namespace();
            if doc.kind() == object.kind() && doc.name() == object.name() && same_namespace {
                candidates.push(doc.to_yaml_bytes()?);
                if max > 0 && candidates.len() == max {
                    break;
                }
            }
        }
        Ok(candidates)
    }
}

impl ManifestSource for BundleManifestSource {
    fn fetch(&self, request: &FetchRequest<'_>) -> Result<FetchedManifests, ExternalError> {
        let object = Resource::from_yaml_bytes(request.object_bytes)?;
        let candidates = self.candidates_for(&object, request.max_candidates)?;
        if candidates.is_empty() {
            return Err(format!("no manifest for {} in bundle", object.display_ref()).into());
        }

        debug!("Bundle holds {} candidate(s) for {}", candidates.len(), object.display_ref());
        Ok(FetchedManifests {
            candidates,
            signature_ref: self.signature_ref.clone(),
        })
    }
}
