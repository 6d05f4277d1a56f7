//! # Tree Nodes
//!
//! [`Node`] is the parsed form of a manifest or live object. It wraps a
//! `serde_json::Value`, which already is the tagged recursive variant
//! (map / sequence / scalar) the diff and mask algorithms need, so no schema
//! knowledge is required anywhere in this crate.
//!
//! ## Flattening
//!
//! Differences and mask paths are addressed by *flattened* dotted paths.
//! Leaves are scalars, `null`, empty maps and empty sequences, so `{}` and a
//! missing field are distinguishable. The diff itself walks both trees in
//! step and only joins keys to label what it found.

use serde_json::Value;

use crate::diff::{DiffResult, Difference};
use crate::Result;

/// A structured document tree.
///
/// Nodes are immutable: [`Node::mask`] returns a new tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    value: Value,
}

impl Node {
    /// Wraps an already-parsed value.
    pub fn from_value(value: Value) -> Self {
        Self { value }
    }

    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `NodeError::Json` if the bytes are not valid JSON.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        let value = serde_json::from_slice(bytes)?;
        Ok(Self { value })
    }

    /// Parses a single YAML document. JSON input is accepted as well.
    ///
    /// # Errors
    ///
    /// Returns `NodeError::Yaml` if the bytes are not valid YAML or contain
    /// more than one document.
    pub fn from_yaml_bytes(bytes: &[u8]) -> Result<Self> {
        let value = serde_yaml::from_slice(bytes)?;
        Ok(Self { value })
    }

    /// Borrows the underlying value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the node and returns the underlying value.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Looks up the value at a dotted path.
    ///
    /// Keys containing dots are resolved by their literal joined path, so
    /// `metadata.annotations.example.com/key` finds the annotation
    /// `example.com/key`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.value, "", path)
    }

    /// Looks up a string value at a dotted path.
    pub fn get_string(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Returns a copy of this tree with every field at (or beneath) one of
    /// `paths` removed. An empty path set returns an identical tree.
    pub fn mask<S: AsRef<str>>(&self, paths: &[S]) -> Node {
        let paths: Vec<&str> = paths.iter().map(AsRef::as_ref).filter(|p| !p.is_empty()).collect();
        if paths.is_empty() {
            return self.clone();
        }
        Node {
            value: mask_value(&self.value, "", &paths),
        }
    }

    /// Computes the structural difference between `self` (the `before` side)
    /// and `other` (the `after` side).
    ///
    /// The diff is symmetric in coverage: a leaf present on only one side is
    /// reported with `null` on the other.
    pub fn diff(&self, other: &Node) -> DiffResult {
        let mut items = Vec::new();
        diff_values(&self.value, &other.value, "", &mut items);
        DiffResult::from_items(items)
    }

    /// Serializes the tree as YAML.
    ///
    /// # Errors
    ///
    /// Returns `NodeError::Yaml` if the value cannot be encoded.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.value)?)
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::from_value(value)
    }
}

/// Dotted leaf paths of `value`, rooted at `prefix`.
pub(crate) fn leaves(value: &Value, prefix: &str) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    leaves_into(value, prefix, &mut out);
    out
}

fn leaves_into(value: &Value, prefix: &str, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                leaves_into(child, &join(prefix, key), out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                leaves_into(child, &join(prefix, &index.to_string()), out);
            }
        }
        leaf => out.push((prefix.to_string(), leaf.clone())),
    }
}

fn is_leaf(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => true,
    }
}

/// Walks both trees in step. Keys are joined only to label differences, so
/// a literal `a.b` key never aliases a nested `a: {b: ..}`.
fn diff_values(before: &Value, after: &Value, prefix: &str, items: &mut Vec<Difference>) {
    if before == after {
        return;
    }
    match (before, after) {
        (Value::Object(left), Value::Object(right)) if !left.is_empty() && !right.is_empty() => {
            for (key, child) in left {
                let path = join(prefix, key);
                match right.get(key) {
                    Some(other) => diff_values(child, other, &path, items),
                    None => removed(child, &path, items),
                }
            }
            for (key, child) in right {
                if !left.contains_key(key) {
                    added(child, &join(prefix, key), items);
                }
            }
        }
        (Value::Array(left), Value::Array(right)) if !left.is_empty() && !right.is_empty() => {
            for index in 0..left.len().max(right.len()) {
                let path = join(prefix, &index.to_string());
                match (left.get(index), right.get(index)) {
                    (Some(child), Some(other)) => diff_values(child, other, &path, items),
                    (Some(child), None) => removed(child, &path, items),
                    (None, Some(other)) => added(other, &path, items),
                    (None, None) => {}
                }
            }
        }
        _ if is_leaf(before) && is_leaf(after) => {
            items.push(Difference::new(prefix, before.clone(), after.clone()));
        }
        _ => {
            removed(before, prefix, items);
            added(after, prefix, items);
        }
    }
}

fn removed(value: &Value, prefix: &str, items: &mut Vec<Difference>) {
    for (path, leaf) in leaves(value, prefix) {
        items.push(Difference::new(path, leaf, Value::Null));
    }
}

fn added(value: &Value, prefix: &str, items: &mut Vec<Difference>) {
    for (path, leaf) in leaves(value, prefix) {
        items.push(Difference::new(path, Value::Null, leaf));
    }
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", prefix, segment)
    }
}

/// True when `path` lies strictly beneath `ancestor`.
fn is_beneath(path: &str, ancestor: &str) -> bool {
    path.len() > ancestor.len() && path.starts_with(ancestor) && path[ancestor.len()..].starts_with('.')
}

fn mask_value(value: &Value, prefix: &str, paths: &[&str]) -> Value {
    match value {
        Value::Object(map) => {
            let mut masked = serde_json::Map::new();
            for (key, child) in map {
                let path = join(prefix, key);
                if paths.iter().any(|p| *p == path) {
                    continue;
                }
                if paths.iter().any(|p| is_beneath(p, &path)) {
                    masked.insert(key.clone(), mask_value(child, &path, paths));
                } else {
                    masked.insert(key.clone(), child.clone());
                }
            }
            Value::Object(masked)
        }
        Value::Array(items) => {
            let mut masked = Vec::with_capacity(items.len());
            for (index, child) in items.iter().enumerate() {
                let path = join(prefix, &index.to_string());
                if paths.iter().any(|p| *p == path) {
                    continue;
                }
                if paths.iter().any(|p| is_beneath(p, &path)) {
                    masked.push(mask_value(child, &path, paths));
                } else {
                    masked.push(child.clone());
                }
            }
            Value::Array(masked)
        }
        scalar => scalar.clone(),
    }
}

fn lookup<'a>(value: &'a Value, prefix: &str, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    match value {
        Value::Object(map) => map.iter().find_map(|(key, child)| {
            let candidate = join(prefix, key);
            if candidate == path {
                Some(child)
            } else if is_beneath(path, &candidate) {
                lookup(child, &candidate, path)
            } else {
                None
            }
        }),
        Value::Array(items) => items.iter().enumerate().find_map(|(index, child)| {
            let candidate = join(prefix, &index.to_string());
            if candidate == path {
                Some(child)
            } else if is_beneath(path, &candidate) {
                lookup(child, &candidate, path)
            } else {
                None
            }
        }),
        _ => None,
    }
}
