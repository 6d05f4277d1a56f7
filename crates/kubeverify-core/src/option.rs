//! Configuration for resource verification.
//!
//! [`VerifyResourceOption`] is owned by the caller (an admission webhook or a
//! CLI) and only read by the verifier. It can be built in code with the
//! `with_*` setters or loaded from a YAML/JSON file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::policy::{ObjectFieldBinding, ObjectFieldBindingList, ObjectReferenceList, SignerList};
use crate::resource::Resource;

/// Default annotation domain for signature material.
pub const DEFAULT_ANNOTATION_DOMAIN: &str = "cosign.sigstore.dev";

/// Default dry-run namespace for namespaced objects.
pub const DEFAULT_DRY_RUN_NAMESPACE: &str = "default";

/// Default cap on the number of candidate manifests tried per object.
pub const DEFAULT_MAX_RESOURCE_MANIFEST_NUM: usize = 3;

const IMAGE_REF_ANNOTATION: &str = "imageRef";
const SIGNATURE_ANNOTATION: &str = "signature";
const CERTIFICATE_ANNOTATION: &str = "certificate";
const MESSAGE_ANNOTATION: &str = "message";
const BUNDLE_ANNOTATION: &str = "bundle";

/// Naming scheme for the annotations that carry signature material.
///
/// Keys are `<domain>/<name>`, e.g. `cosign.sigstore.dev/signature`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnotationConfig {
    /// Annotation key domain.
    pub domain: String,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            domain: DEFAULT_ANNOTATION_DOMAIN.to_string(),
        }
    }
}

impl AnnotationConfig {
    pub fn new(domain: impl Into<String>) -> Self {
        Self { domain: domain.into() }
    }

    fn key(&self, name: &str) -> String {
        format!("{}/{}", self.domain, name)
    }

    pub fn image_ref_key(&self) -> String {
        self.key(IMAGE_REF_ANNOTATION)
    }

    pub fn signature_key(&self) -> String {
        self.key(SIGNATURE_ANNOTATION)
    }

    pub fn certificate_key(&self) -> String {
        self.key(CERTIFICATE_ANNOTATION)
    }

    pub fn message_key(&self) -> String {
        self.key(MESSAGE_ANNOTATION)
    }

    pub fn bundle_key(&self) -> String {
        self.key(BUNDLE_ANNOTATION)
    }

    /// Field paths of the signature annotations. Signing adds these to the
    /// object after the manifest was signed, so they never match.
    pub fn ignore_field_paths(&self) -> Vec<String> {
        [
            self.signature_key(),
            self.certificate_key(),
            self.message_key(),
            self.bundle_key(),
        ]
        .into_iter()
        .map(|key| format!("metadata.annotations.{}", key))
        .collect()
    }
}

/// Fields commonly rewritten by the API server and controllers.
///
/// Not applied automatically; add them with
/// `option.with_ignore_fields(option.ignore_fields.with_binding(default_ignore_fields()))`
/// or list them in the config file.
pub fn default_ignore_fields() -> ObjectFieldBinding {
    ObjectFieldBinding::for_all_objects([
        "metadata.managedFields",
        "metadata.resourceVersion",
        "metadata.selfLink",
        "metadata.uid",
        "metadata.creationTimestamp",
        "metadata.generation",
        "metadata.annotations.kubectl.kubernetes.io/last-applied-configuration",
        "metadata.annotations.deployment.kubernetes.io/revision",
        "status",
    ])
}

/// Options for a single resource verification.
///
/// # Example
///
/// ```rust
/// use kubeverify_core::{SignerList, VerifyResourceOption};
///
/// let option = VerifyResourceOption::new()
///     .with_image_ref("registry.example.com/manifests:v1")
///     .with_signers(SignerList::new(["release@example.com"]))
///     .with_check_dry_run_for_apply(true);
///
/// assert_eq!(option.max_resource_manifest_num, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifyResourceOption {
    /// Explicit manifest image reference; overrides the object annotation.
    pub image_ref: Option<String>,
    /// Reference to a resource holding the signed manifest and signature.
    pub signature_resource_ref: Option<String>,
    /// Reference to a resource holding provenance records.
    pub provenance_resource_ref: Option<String>,
    /// Namespace used for dry-run creation of namespaced objects.
    pub dry_run_namespace: Option<String>,
    /// Enable the simulated-apply match tier.
    pub check_dry_run_for_apply: bool,
    /// Trusted signers.
    pub signers: SignerList,
    /// Objects exempt from verification.
    pub skip_objects: ObjectReferenceList,
    /// Fields allowed to drift, per object selector.
    pub ignore_fields: ObjectFieldBindingList,
    /// Path to verification key material.
    pub key_path: Option<PathBuf>,
    /// Retrieve provenance records for the verdict.
    pub provenance: bool,
    /// Maximum number of candidate manifests to try.
    pub max_resource_manifest_num: usize,
    /// Annotation naming scheme.
    pub annotation_config: AnnotationConfig,
}

impl Default for VerifyResourceOption {
    fn default() -> Self {
        Self {
            image_ref: None,
            signature_resource_ref: None,
            provenance_resource_ref: None,
            dry_run_namespace: None,
            check_dry_run_for_apply: false,
            signers: SignerList::default(),
            skip_objects: ObjectReferenceList::default(),
            ignore_fields: ObjectFieldBindingList::default(),
            key_path: None,
            provenance: false,
            max_resource_manifest_num: DEFAULT_MAX_RESOURCE_MANIFEST_NUM,
            annotation_config: AnnotationConfig::default(),
        }
    }
}

impl VerifyResourceOption {
    /// Creates an option with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an option document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed documents and
    /// `ConfigError::Invalid` if validation fails.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let option: Self = serde_yaml::from_str(yaml)?;
        option.validate()?;
        Ok(option)
    }

    /// Loads an option file (YAML or JSON).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read, otherwise as
    /// [`VerifyResourceOption::from_yaml_str`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Checks field values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when the manifest cap is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_resource_manifest_num == 0 {
            return Err(ConfigError::Invalid {
                field: "maxResourceManifestNum",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn with_image_ref(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    pub fn with_signature_resource_ref(mut self, reference: impl Into<String>) -> Self {
        self.signature_resource_ref = Some(reference.into());
        self
    }

    pub fn with_provenance_resource_ref(mut self, reference: impl Into<String>) -> Self {
        self.provenance_resource_ref = Some(reference.into());
        self
    }

    pub fn with_dry_run_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.dry_run_namespace = Some(namespace.into());
        self
    }

    pub fn with_check_dry_run_for_apply(mut self, enabled: bool) -> Self {
        self.check_dry_run_for_apply = enabled;
        self
    }

    pub fn with_signers(mut self, signers: SignerList) -> Self {
        self.signers = signers;
        self
    }

    pub fn with_skip_objects(mut self, skip: ObjectReferenceList) -> Self {
        self.skip_objects = skip;
        self
    }

    pub fn with_ignore_fields(mut self, ignore: ObjectFieldBindingList) -> Self {
        self.ignore_fields = ignore;
        self
    }

    pub fn with_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = Some(path.into());
        self
    }

    pub fn with_provenance(mut self, enabled: bool) -> Self {
        self.provenance = enabled;
        self
    }

    pub fn with_max_resource_manifest_num(mut self, max: usize) -> Self {
        self.max_resource_manifest_num = max;
        self
    }

    pub fn with_annotation_config(mut self, config: AnnotationConfig) -> Self {
        self.annotation_config = config;
        self
    }

    /// The ignore-field policy actually applied: the configured bindings
    /// plus the signature annotations for every object.
    ///
    /// Derived on each call; the option itself is never modified.
    pub fn effective_ignore_fields(&self) -> ObjectFieldBindingList {
        self.ignore_fields
            .with_binding(ObjectFieldBinding::for_all_objects(self.annotation_config.ignore_field_paths()))
    }

    /// Resolves the manifest image reference for `resource`: the explicit
    /// option wins, then the image-ref annotation.
    pub fn resolve_image_ref(&self, resource: &Resource) -> Option<String> {
        if let Some(image_ref) = self.image_ref.as_deref().filter(|r| !r.is_empty()) {
            return Some(image_ref.to_string());
        }
        resource
            .annotation(&self.annotation_config.image_ref_key())
            .filter(|r| !r.is_empty())
            .map(str::to_string)
    }

    /// Namespace for dry-run creation of namespaced objects.
    pub fn effective_dry_run_namespace(&self) -> &str {
        self.dry_run_namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(DEFAULT_DRY_RUN_NAMESPACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ObjectReference;
    use serde_json::json;
    use std::io::Write;

    fn annotated(annotations: serde_json::Value) -> Resource {
        Resource::from_value(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "cm", "namespace": "prod", "annotations": annotations}
        }))
        .unwrap()
    }

    #[test]
    fn test_default_option() {
        let option = VerifyResourceOption::default();
        assert_eq!(option.max_resource_manifest_num, 3);
        assert!(!option.check_dry_run_for_apply);
        assert_eq!(option.effective_dry_run_namespace(), "default");
        assert_eq!(option.annotation_config.domain, "cosign.sigstore.dev");
    }

    #[test]
    fn test_annotation_keys() {
        let config = AnnotationConfig::new("example.com");
        assert_eq!(config.image_ref_key(), "example.com/imageRef");
        assert_eq!(
            config.ignore_field_paths(),
            vec![
                "metadata.annotations.example.com/signature",
                "metadata.annotations.example.com/certificate",
                "metadata.annotations.example.com/message",
                "metadata.annotations.example.com/bundle",
            ]
        );
    }

    #[test]
    fn test_image_ref_explicit_wins() {
        let resource = annotated(json!({"cosign.sigstore.dev/imageRef": "from-annotation"}));
        let option = VerifyResourceOption::new().with_image_ref("explicit");
        assert_eq!(option.resolve_image_ref(&resource).as_deref(), Some("explicit"));
    }

    #[test]
    fn test_image_ref_from_annotation() {
        let resource = annotated(json!({"cosign.sigstore.dev/imageRef": "from-annotation"}));
        let option = VerifyResourceOption::new();
        assert_eq!(option.resolve_image_ref(&resource).as_deref(), Some("from-annotation"));
    }

    #[test]
    fn test_image_ref_absent() {
        let resource = annotated(json!({}));
        assert_eq!(VerifyResourceOption::new().resolve_image_ref(&resource), None);
    }

    #[test]
    fn test_effective_ignore_fields_does_not_mutate() {
        let option = VerifyResourceOption::new().with_ignore_fields(ObjectFieldBindingList::new(vec![
            ObjectFieldBinding::new(["data.extra"], vec![ObjectReference::kind("ConfigMap")]),
        ]));

        let effective = option.effective_ignore_fields();
        assert_eq!(option.ignore_fields.0.len(), 1);
        assert_eq!(effective.0.len(), 2);

        let fields = effective.matches(&annotated(json!({}))).unwrap();
        assert_eq!(fields[0], "data.extra");
        assert!(fields.contains(&"metadata.annotations.cosign.sigstore.dev/message".to_string()));
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
imageRef: registry.example.com/manifests:v2
checkDryRunForApply: true
dryRunNamespace: verify-sandbox
signers: ["release@example.com"]
skipObjects:
  - kind: Event
ignoreFields:
  - fields: ["status"]
    objects:
      - kind: "*"
maxResourceManifestNum: 5
annotationConfig:
  domain: integrity.example.com
"#;
        let option = VerifyResourceOption::from_yaml_str(yaml).unwrap();
        assert_eq!(option.image_ref.as_deref(), Some("registry.example.com/manifests:v2"));
        assert!(option.check_dry_run_for_apply);
        assert_eq!(option.effective_dry_run_namespace(), "verify-sandbox");
        assert!(option.signers.matches("release@example.com"));
        assert_eq!(option.skip_objects.len(), 1);
        assert_eq!(option.max_resource_manifest_num, 5);
        assert_eq!(option.annotation_config.image_ref_key(), "integrity.example.com/imageRef");
        assert!(!option.provenance);
    }

    #[test]
    fn test_zero_manifest_cap_rejected() {
        let err = VerifyResourceOption::from_yaml_str("maxResourceManifestNum: 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "maxResourceManifestNum", .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"provenance\": true, \"keyPath\": \"/etc/keys/cosign.pub\"}}").unwrap();

        let option = VerifyResourceOption::load(file.path()).unwrap();
        assert!(option.provenance);
        assert_eq!(option.key_path, Some(PathBuf::from("/etc/keys/cosign.pub")));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = VerifyResourceOption::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_default_ignore_fields_cover_status() {
        let binding = default_ignore_fields();
        assert!(binding.fields.contains(&"status".to_string()));
        assert!(binding.objects.matches(&annotated(json!({}))));
    }
}
