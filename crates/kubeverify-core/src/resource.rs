//! Live Kubernetes objects.
//!
//! A [`Resource`] is the read-only, schema-less view of an object as observed
//! in the cluster. Identity accessors never fail: a missing field reads as an
//! empty string, which for `metadata.namespace` means cluster-scoped.

use kubeverify_mapnode::Node;
use serde_json::Value;

use crate::error::ResourceError;

/// Kind name of a CustomResourceDefinition.
pub const CRD_KIND: &str = "CustomResourceDefinition";

/// A live Kubernetes object.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    node: Node,
}

impl Resource {
    /// Wraps a parsed object.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::NotAnObject` unless `value` is a map.
    pub fn from_value(value: Value) -> Result<Self, ResourceError> {
        if !value.is_object() {
            return Err(ResourceError::NotAnObject);
        }
        Ok(Self {
            node: Node::from_value(value),
        })
    }

    /// Parses an object from YAML (or JSON) bytes.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::Parse` on malformed input and
    /// `ResourceError::NotAnObject` if the document is not a map.
    pub fn from_yaml_bytes(bytes: &[u8]) -> Result<Self, ResourceError> {
        let node = Node::from_yaml_bytes(bytes)?;
        Self::from_value(node.into_value())
    }

    /// Parses an object from JSON bytes.
    ///
    /// # Errors
    ///
    /// Same as [`Resource::from_yaml_bytes`].
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, ResourceError> {
        let node = Node::from_json_bytes(bytes)?;
        Self::from_value(node.into_value())
    }

    /// The raw object.
    pub fn value(&self) -> &Value {
        self.node.value()
    }

    /// A tree view of the object for diffing.
    pub fn to_node(&self) -> Node {
        self.node.clone()
    }

    pub fn api_version(&self) -> &str {
        self.str_at("apiVersion")
    }

    /// API group; empty for the core group (`v1`).
    pub fn group(&self) -> &str {
        match self.api_version().rsplit_once('/') {
            Some((group, _)) => group,
            None => "",
        }
    }

    pub fn version(&self) -> &str {
        match self.api_version().rsplit_once('/') {
            Some((_, version)) => version,
            None => self.api_version(),
        }
    }

    pub fn kind(&self) -> &str {
        self.str_at("kind")
    }

    pub fn name(&self) -> &str {
        self.str_at("metadata.name")
    }

    /// Namespace of the object, empty when cluster-scoped.
    pub fn namespace(&self) -> &str {
        self.str_at("metadata.namespace")
    }

    pub fn is_cluster_scoped(&self) -> bool {
        self.namespace().is_empty()
    }

    pub fn is_crd(&self) -> bool {
        self.kind() == CRD_KIND
    }

    /// Looks up a single annotation.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.node.get_string(&format!("metadata.annotations.{}", key))
    }

    /// Canonical YAML form handed to the manifest source and signature
    /// verifier. Map keys are emitted in sorted order.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::Serialize` if encoding fails.
    pub fn to_yaml_bytes(&self) -> Result<Vec<u8>, ResourceError> {
        let yaml = serde_yaml::to_string(self.node.value()).map_err(|e| ResourceError::Serialize(e.to_string()))?;
        Ok(yaml.into_bytes())
    }

    /// Short `kind/namespace/name` label for log lines.
    pub fn display_ref(&self) -> String {
        if self.is_cluster_scoped() {
            format!("{}/{}", self.kind(), self.name())
        } else {
            format!("{}/{}/{}", self.kind(), self.namespace(), self.name())
        }
    }

    fn str_at(&self, path: &str) -> &str {
        self.node.get_string(path).unwrap_or_default()
    }
}
