//! # Integration Tests for Mapnode
//!
//! Exercises parse → mask → diff → filter the way the manifest matcher
//! chains them.

use crate::{DiffResult, Node};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn live_configmap() -> Node {
    Node::from_value(json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {
            "name": "app-config",
            "namespace": "prod",
            "uid": "7c1d7a1e",
            "resourceVersion": "4711",
            "annotations": {
                "cosign.sigstore.dev/message": "H4sIAAAA",
                "cosign.sigstore.dev/signature": "MEUCIQ"
            }
        },
        "data": {"a": "1"}
    }))
}

fn signed_configmap() -> Node {
    Node::from_yaml_bytes(
        b"apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: app-config\ndata:\n  a: \"1\"\n",
    )
    .unwrap()
}

// =============================================================================
// Mask + Diff
// =============================================================================

#[test]
fn test_server_fields_show_up_as_drift() {
    let diff = live_configmap().diff(&signed_configmap());
    assert_eq!(
        diff.keys(),
        vec![
            "metadata.annotations.cosign.sigstore.dev/message",
            "metadata.annotations.cosign.sigstore.dev/signature",
            "metadata.namespace",
            "metadata.resourceVersion",
            "metadata.uid",
        ]
    );
}

#[test]
fn test_ignore_fields_suppress_expected_drift() {
    let diff = live_configmap().diff(&signed_configmap());
    let (_, remaining) = diff.filter(&[
        "metadata.annotations.cosign.sigstore.dev/*",
        "metadata.namespace",
        "metadata.resourceVersion",
        "metadata.uid",
    ]);
    assert!(remaining.is_empty());
}

#[test]
fn test_symmetric_mask_hides_rewritten_fields() {
    let live = Node::from_value(json!({"metadata": {"name": "cm", "namespace": "prod"}, "data": {"a": "1"}}));
    let simulated = Node::from_value(json!({"metadata": {"name": "cm-dryrun", "namespace": "default"}, "data": {"a": "1"}}));

    let mask = ["metadata.name", "metadata.namespace"];
    assert!(live.mask(&mask).diff(&simulated.mask(&mask)).is_empty());
}

#[test]
fn test_tampered_value_survives_filtering() {
    let live = Node::from_value(json!({"data": {"a": "2"}, "status": {"phase": "Active"}}));
    let signed = Node::from_value(json!({"data": {"a": "1"}}));

    let (_, remaining) = live.diff(&signed).filter(&["status"]);
    assert_eq!(remaining.keys(), vec!["data.a"]);
}

#[test]
fn test_diff_result_serialization_roundtrip() {
    let diff = live_configmap().diff(&signed_configmap());
    let json = serde_json::to_string(&diff).unwrap();
    let parsed: DiffResult = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, diff);
}
