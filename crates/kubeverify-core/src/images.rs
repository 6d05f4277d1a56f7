//! Container image extraction.
//!
//! Walks the pod template of workload kinds and collects every container
//! image, so the verdict tells the caller which images the verified manifest
//! actually runs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ImageError;
use crate::resource::Resource;

const CONTAINER_FIELDS: [&str; 3] = ["initContainers", "containers", "ephemeralContainers"];

const POD_SPEC: &[&str] = &["spec"];
const TEMPLATE_SPEC: &[&str] = &["spec", "template", "spec"];
const JOB_TEMPLATE_SPEC: &[&str] = &["spec", "jobTemplate", "spec", "template", "spec"];

/// A container image referenced by a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageObject {
    pub resource_kind: String,
    pub resource_name: String,
    pub container_name: String,
    /// Image reference as written in the pod spec.
    pub image: String,
    /// `sha256:...` digest when the reference is pinned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Path to the pod spec for workload kinds, `None` for everything else.
fn pod_spec_path(kind: &str) -> Option<&'static [&'static str]> {
    match kind {
        "Pod" => Some(POD_SPEC),
        "Deployment" | "StatefulSet" | "DaemonSet" | "ReplicaSet" | "ReplicationController" | "Job" => {
            Some(TEMPLATE_SPEC)
        }
        "CronJob" => Some(JOB_TEMPLATE_SPEC),
        _ => None,
    }
}

/// Collects the container images of `resource`.
///
/// Kinds without a pod template yield an empty list, as does a workload whose
/// pod spec is absent.
///
/// # Errors
///
/// Returns an [`ImageError`] when a container list is present but malformed.
pub fn container_images(resource: &Resource) -> Result<Vec<ImageObject>, ImageError> {
    let Some(path) = pod_spec_path(resource.kind()) else {
        return Ok(Vec::new());
    };

    let mut spec = resource.value();
    for segment in path {
        match spec.get(*segment) {
            Some(next) => spec = next,
            None => return Ok(Vec::new()),
        }
    }
    let spec_path = path.join(".");

    let mut images = Vec::new();
    for field in CONTAINER_FIELDS {
        let Some(list) = spec.get(field) else {
            continue;
        };
        let list_path = format!("{}.{}", spec_path, field);
        let containers = match list {
            Value::Array(items) => items,
            Value::Null => continue,
            _ => return Err(ImageError::NotAList { path: list_path }),
        };

        for (index, container) in containers.iter().enumerate() {
            let entry_path = format!("{}.{}", list_path, index);
            let Some(container) = container.as_object() else {
                return Err(ImageError::NotAContainer { path: entry_path });
            };
            let container_name = container
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let image = match container.get("image").and_then(Value::as_str) {
                Some(image) if !image.is_empty() => image.to_string(),
                _ => {
                    return Err(ImageError::MissingImage {
                        path: entry_path,
                        container: container_name,
                    })
                }
            };

            images.push(ImageObject {
                resource_kind: resource.kind().to_string(),
                resource_name: resource.name().to_string(),
                container_name,
                digest: digest_of(&image),
                image,
            });
        }
    }

    Ok(images)
}

fn digest_of(image: &str) -> Option<String> {
    image
        .split_once('@')
        .map(|(_, digest)| digest)
        .filter(|digest| digest.starts_with("sha256:"))
        .map(str::to_string)
}
