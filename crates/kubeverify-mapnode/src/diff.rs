//! # Structural Diff Results
//!
//! A [`DiffResult`] is the ordered list of leaf paths whose values differ
//! between two trees. Its size is the only thing the matcher decides on
//! (zero means equivalent); the items themselves are carried into the verdict
//! so an operator can see *what* drifted.
//!
//! ## Wire Format
//!
//! ```json
//! {"items":[{"key":"data.b","values":{"before":"x","after":null}}]}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pattern::matches_path;

/// The two sides of a single differing leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffValues {
    /// Value on the receiver side of [`Node::diff`](crate::Node::diff), `null` if absent.
    pub before: Value,
    /// Value on the argument side, `null` if absent.
    pub after: Value,
}

/// A single differing leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difference {
    /// Dotted path of the leaf.
    pub key: String,
    /// Values on both sides.
    pub values: DiffValues,
}

impl Difference {
    /// Creates a difference entry.
    pub fn new(key: impl Into<String>, before: Value, after: Value) -> Self {
        Self {
            key: key.into(),
            values: DiffValues { before, after },
        }
    }
}

/// Structural delta between two trees, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffResult {
    items: Vec<Difference>,
}

impl DiffResult {
    /// Builds a result from arbitrary items, sorting them by key.
    pub fn from_items(mut items: Vec<Difference>) -> Self {
        items.sort_by(|a, b| a.key.cmp(&b.key));
        Self { items }
    }

    /// The differing leaves.
    pub fn items(&self) -> &[Difference] {
        &self.items
    }

    /// Number of differing leaves.
    pub fn size(&self) -> usize {
        self.items.len()
    }

    /// True when the two trees were equivalent.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The differing paths, in order.
    pub fn keys(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.key.as_str()).collect()
    }

    /// Splits the result by a set of ignore-field patterns.
    ///
    /// Returns `(dropped, remaining)`: `dropped` holds every item matched by
    /// at least one pattern (see [`matches_path`]), `remaining` the rest.
    /// Relative order is preserved on both sides.
    pub fn filter<S: AsRef<str>>(&self, patterns: &[S]) -> (DiffResult, DiffResult) {
        let (dropped, remaining): (Vec<_>, Vec<_>) = self
            .items
            .iter()
            .cloned()
            .partition(|item| patterns.iter().any(|p| matches_path(p.as_ref(), &item.key)));

        (DiffResult { items: dropped }, DiffResult { items: remaining })
    }
}

impl fmt::Display for DiffResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
