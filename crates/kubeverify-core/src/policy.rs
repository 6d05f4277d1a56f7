//! # Policy Evaluators
//!
//! Pure configuration lookups consulted by the verifier:
//!
//! | Evaluator | Question | Used for |
//! |-----------|----------|----------|
//! | [`ObjectReferenceList`] | Does this object match any selector? | Skip objects |
//! | [`ObjectFieldBindingList`] | Which fields may drift on this object? | Ignore fields |
//! | [`SignerList`] | Is this signer trusted? | Signer allowlist |
//!
//! Every selector string is a glob where `*` matches any run of characters.

use kubeverify_mapnode::match_pattern;
use serde::{Deserialize, Serialize};

use crate::resource::Resource;

/// Selector for Kubernetes objects.
///
/// Each field is a glob. An empty field places no constraint, so the default
/// reference selects every object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectReference {
    /// API group (empty string is the core group).
    pub group: String,
    /// API version.
    pub version: String,
    /// Kind.
    pub kind: String,
    /// Namespace.
    pub namespace: String,
    /// Name.
    pub name: String,
}

impl ObjectReference {
    /// Selects every object of the given kind.
    pub fn kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Restricts the selector to a group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Restricts the selector to a version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Restricts the selector to a namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Restricts the selector to a name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns true if `resource` satisfies every non-empty field.
    pub fn matches(&self, resource: &Resource) -> bool {
        field_matches(&self.group, resource.group())
            && field_matches(&self.version, resource.version())
            && field_matches(&self.kind, resource.kind())
            && field_matches(&self.namespace, resource.namespace())
            && field_matches(&self.name, resource.name())
    }
}

fn field_matches(pattern: &str, value: &str) -> bool {
    pattern.is_empty() || match_pattern(pattern, value)
}

/// A list of object selectors; matches if any entry matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectReferenceList(pub Vec<ObjectReference>);

impl ObjectReferenceList {
    pub fn new(references: Vec<ObjectReference>) -> Self {
        Self(references)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if any selector matches `resource`.
    pub fn matches(&self, resource: &Resource) -> bool {
        self.0.iter().any(|r| r.matches(resource))
    }
}

impl From<Vec<ObjectReference>> for ObjectReferenceList {
    fn from(references: Vec<ObjectReference>) -> Self {
        Self(references)
    }
}

/// Binds a set of ignore-field paths to the objects they apply to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectFieldBinding {
    /// Dotted field paths (globs allowed) allowed to drift.
    pub fields: Vec<String>,
    /// Objects the fields apply to.
    pub objects: ObjectReferenceList,
}

impl ObjectFieldBinding {
    /// Creates a binding from fields and selectors.
    pub fn new<S: Into<String>>(fields: impl IntoIterator<Item = S>, objects: Vec<ObjectReference>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            objects: ObjectReferenceList(objects),
        }
    }

    /// Binds fields to every object.
    pub fn for_all_objects<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self::new(fields, vec![ObjectReference::kind("*")])
    }
}

/// Ignore-field policy: a list of bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectFieldBindingList(pub Vec<ObjectFieldBinding>);

impl ObjectFieldBindingList {
    pub fn new(bindings: Vec<ObjectFieldBinding>) -> Self {
        Self(bindings)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a new list with `binding` appended. `self` is left untouched.
    pub fn with_binding(&self, binding: ObjectFieldBinding) -> Self {
        let mut bindings = self.0.clone();
        bindings.push(binding);
        Self(bindings)
    }

    /// Resolves the ignore fields for `resource`.
    ///
    /// Returns `None` when no binding selects the object, otherwise the
    /// union of the fields of every selecting binding, in declaration order
    /// without duplicates.
    pub fn matches(&self, resource: &Resource) -> Option<Vec<String>> {
        let mut matched = false;
        let mut fields: Vec<String> = Vec::new();
        for binding in self.0.iter().filter(|b| b.objects.matches(resource)) {
            matched = true;
            for field in &binding.fields {
                if !fields.contains(field) {
                    fields.push(field.clone());
                }
            }
        }
        matched.then_some(fields)
    }
}

impl From<Vec<ObjectFieldBinding>> for ObjectFieldBindingList {
    fn from(bindings: Vec<ObjectFieldBinding>) -> Self {
        Self(bindings)
    }
}

/// Signer allowlist.
///
/// An empty list trusts every signer whose signature verifies; otherwise the
/// signer identity must match at least one glob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignerList(pub Vec<String>);

impl SignerList {
    pub fn new<S: Into<String>>(signers: impl IntoIterator<Item = S>) -> Self {
        Self(signers.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if `signer` is allowed.
    pub fn matches(&self, signer: &str) -> bool {
        if self.0.is_empty() {
            return true;
        }
        self.0.iter().any(|pattern| match_pattern(pattern, signer))
    }
}
