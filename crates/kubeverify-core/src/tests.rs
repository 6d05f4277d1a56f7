//! Unit tests for kubeverify-core.

#[test]
fn test_crate_structure() {
    // Smoke test - verifies the public surface hangs together
    use crate::{
        mask_paths, AnnotationConfig, MatchOutcome, ObjectFieldBinding, SignerList, VerifyResourceOption,
        VerifyResourceResult,
    };

    let option = VerifyResourceOption::default();
    let _annotations = AnnotationConfig::default();
    let _binding = ObjectFieldBinding::for_all_objects(["status"]);
    let _signers = SignerList::default();
    let _verdict = VerifyResourceResult::out_of_scope();
    let _outcome = MatchOutcome::matched();

    assert!(option.validate().is_ok());
    assert_eq!(mask_paths(false, false).len(), 2);
}

#[test]
fn test_effective_ignore_fields_cover_signature_annotations() {
    use crate::{Resource, VerifyResourceOption};

    let resource = Resource::from_value(serde_json::json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": {"name": "creds", "namespace": "prod"}
    }))
    .unwrap();
    let option = VerifyResourceOption::default();

    let fields = option.effective_ignore_fields().matches(&resource).unwrap();
    assert!(fields.contains(&"metadata.annotations.cosign.sigstore.dev/signature".to_string()));
    assert!(fields.contains(&"metadata.annotations.cosign.sigstore.dev/bundle".to_string()));
    assert!(option.ignore_fields.is_empty());
}
