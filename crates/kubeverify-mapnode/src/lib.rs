//! # Kubeverify Mapnode - Structural Manifest Trees
//!
//! Mapnode turns Kubernetes documents (JSON or YAML) into a dynamically typed
//! tree and provides the three primitives the verifier builds on: field
//! lookup, masking, and structural diffing.
//!
//! ## Threat Model
//!
//! | Threat | Description | Defense |
//! |--------|-------------|---------|
//! | Key Reordering | Same manifest serialized with a different key order | Maps are compared key by key, never by position |
//! | Key Aliasing | Literal `a.b` key standing in for nested `a: {b: ..}` | Both trees are walked in step; dotted paths only label differences |
//! | Format Laundering | Signed YAML applied as JSON (or vice versa) | Both formats parse into one tree model |
//! | Hidden Fields | Extra field smuggled into a live object | Diff is symmetric: additions on either side are reported |
//! | Over-broad Suppression | Ignore rule hiding more than intended | Patterns match a path or its descendants only |
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                         MAPNODE                            │
//! ├────────────────────────────────────────────────────────────┤
//! │                                                            │
//! │   bytes ──▶ ┌──────────┐  mask(paths)  ┌──────────┐        │
//! │   (json/    │   Node   │──────────────▶│   Node   │        │
//! │    yaml)    └────┬─────┘               └────┬─────┘        │
//! │                  │                          │              │
//! │                  └────────── diff ──────────┘              │
//! │                               │                            │
//! │                               ▼                            │
//! │                        ┌────────────┐  filter(patterns)    │
//! │                        │ DiffResult │──────────────────▶   │
//! │                        └────────────┘                      │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Paths
//!
//! Fields are addressed by dotted paths. Map keys are joined with `.` and
//! sequence elements use their index, so the image of the first container of
//! a Deployment is `spec.template.spec.containers.0.image`. Keys that contain
//! dots themselves (annotation keys such as `cosign.sigstore.dev/message`) are
//! addressed by their literal joined path:
//! `metadata.annotations.cosign.sigstore.dev/message`.
//!
//! ## Usage
//!
//! ```rust
//! use kubeverify_mapnode::Node;
//!
//! let live = Node::from_yaml_bytes(b"kind: ConfigMap\ndata:\n  a: '1'\n  b: x\n").unwrap();
//! let signed = Node::from_yaml_bytes(b"kind: ConfigMap\ndata:\n  a: '1'\n").unwrap();
//!
//! let diff = live.diff(&signed);
//! assert_eq!(diff.size(), 1);
//!
//! let (_, remaining) = diff.filter(&["data.b"]);
//! assert!(remaining.is_empty());
//! ```

pub mod diff;
pub mod error;
pub mod node;
pub mod pattern;

pub use diff::{DiffResult, DiffValues, Difference};
pub use error::NodeError;
pub use node::Node;
pub use pattern::{match_pattern, matches_path};

/// Result type for mapnode operations.
pub type Result<T> = std::result::Result<T, NodeError>;

#[cfg(test)]
mod tests;
