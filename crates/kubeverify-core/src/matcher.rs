//! # Three-Tier Matching Engine
//!
//! Decides whether a live object is the admitted form of a candidate
//! manifest. Objects rarely come back from the API server byte-identical to
//! what was applied: defaulting, mutating webhooks and apply-merge semantics
//! all add fields. The engine escalates through progressively more realistic
//! simulations until one of them explains the live object.
//!
//! ```text
//!  live object ──┐
//!                ├─► Tier 1: direct diff ─────────────────────────► match?
//!  manifest ─────┤
//!                ├─► Tier 2: dry-run create(manifest) ── mask ─────► match?
//!                │
//!                └─► Tier 3: apply patch ─► dry-run create ── mask ► match?
//!                    (only when apply simulation is allowed)
//! ```
//!
//! Every tier filters its diff by the resolved ignore fields before the
//! empty check. Tiers 2 and 3 mask the same fixed path set on both sides
//! (see [`mask_paths`]). When nothing matches, the diff of the last tier
//! attempted is reported.

use std::fmt;

use kubeverify_mapnode::{DiffResult, Node};
use tracing::debug;

use crate::error::MatchError;
use crate::resource::Resource;
use crate::source::AdmissionSimulator;

const NAMESPACE_PATH: &str = "metadata.namespace";

const CRD_NAME_PATHS: [&str; 4] = [
    "spec.names.kind",
    "spec.names.listKind",
    "spec.names.singular",
    "spec.names.plural",
];

/// A matching tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// Live object against the manifest as written.
    Direct,
    /// Live object against a dry-run create of the manifest.
    DryRunCreate,
    /// Live object against a dry-run create of the apply-patched object.
    DryRunApply,
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchTier::Direct => "direct",
            MatchTier::DryRunCreate => "dry-run create",
            MatchTier::DryRunApply => "dry-run apply",
        };
        f.write_str(name)
    }
}

/// Result of one comparison. A match never carries a diff.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    matched: bool,
    diff: Option<DiffResult>,
}

impl MatchOutcome {
    pub fn matched() -> Self {
        Self {
            matched: true,
            diff: None,
        }
    }

    pub fn mismatched(diff: DiffResult) -> Self {
        Self {
            matched: false,
            diff: Some(diff),
        }
    }

    /// Filters `diff` by `ignore_fields`; an empty remainder is a match.
    pub fn from_diff<S: AsRef<str>>(diff: &DiffResult, ignore_fields: &[S]) -> Self {
        let (_, remaining) = diff.filter(ignore_fields);
        if remaining.is_empty() {
            Self::matched()
        } else {
            Self::mismatched(remaining)
        }
    }

    pub fn is_match(&self) -> bool {
        self.matched
    }

    /// The filtered diff, `None` on a match.
    pub fn diff(&self) -> Option<&DiffResult> {
        self.diff.as_ref()
    }

    pub fn into_diff(self) -> Option<DiffResult> {
        self.diff
    }
}

/// One tier and what it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TierAttempt {
    pub tier: MatchTier,
    pub outcome: MatchOutcome,
}

/// Every tier attempted for one candidate, in order.
///
/// Always holds at least the direct attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchReport {
    attempts: Vec<TierAttempt>,
}

impl MatchReport {
    fn new(tier: MatchTier, outcome: MatchOutcome) -> Self {
        Self {
            attempts: vec![TierAttempt { tier, outcome }],
        }
    }

    fn push(&mut self, tier: MatchTier, outcome: MatchOutcome) {
        self.attempts.push(TierAttempt { tier, outcome });
    }

    pub fn attempts(&self) -> &[TierAttempt] {
        &self.attempts
    }

    /// The last tier attempted.
    pub fn last_tier(&self) -> MatchTier {
        self.last().tier
    }

    /// Outcome of the last tier attempted.
    pub fn outcome(&self) -> &MatchOutcome {
        &self.last().outcome
    }

    pub fn matched(&self) -> bool {
        self.outcome().is_match()
    }

    pub fn into_outcome(mut self) -> MatchOutcome {
        let last = self.attempts.len() - 1;
        self.attempts.swap_remove(last).outcome
    }

    fn last(&self) -> &TierAttempt {
        &self.attempts[self.attempts.len() - 1]
    }
}

/// Per-call matching parameters.
#[derive(Debug, Clone, Copy)]
pub struct MatchSettings<'a> {
    /// Resolved ignore-field patterns for the object.
    pub ignore_fields: &'a [String],
    /// Namespace for dry-run creation of namespaced objects.
    pub dry_run_namespace: &'a str,
    /// Whether Tier 3 may run.
    pub allow_apply_simulation: bool,
}

/// Paths masked on both sides before diffing in Tiers 2 and 3.
///
/// `metadata.name` always; `metadata.namespace` for namespaced objects; the
/// generated `spec.names.*` fields for CRDs.
pub fn mask_paths(cluster_scope: bool, is_crd: bool) -> Vec<&'static str> {
    let mut paths = vec!["metadata.name"];
    if !cluster_scope {
        paths.push(NAMESPACE_PATH);
    }
    if is_crd {
        paths.extend(CRD_NAME_PATHS);
    }
    paths
}

/// Compares live objects with candidate manifests.
pub struct ManifestMatcher<'a> {
    simulator: &'a dyn AdmissionSimulator,
}

impl<'a> ManifestMatcher<'a> {
    pub fn new(simulator: &'a dyn AdmissionSimulator) -> Self {
        Self { simulator }
    }

    /// Runs the tiers for one candidate and stops at the first match.
    ///
    /// # Errors
    ///
    /// Returns a [`MatchError`] if the manifest or a simulated object cannot
    /// be parsed, or a simulator call fails. A plain mismatch is not an error.
    pub fn match_manifest(
        &self,
        object: &Resource,
        manifest: &[u8],
        settings: &MatchSettings<'_>,
    ) -> Result<MatchReport, MatchError> {
        let object_node = object.to_node();
        let manifest_node = Node::from_yaml_bytes(manifest).map_err(MatchError::ManifestNode)?;

        let cluster_scope = object.is_cluster_scoped();
        let dry_run_namespace = (!cluster_scope).then_some(settings.dry_run_namespace);
        let masks = mask_paths(cluster_scope, object.is_crd());

        let direct = object_node.diff(&manifest_node);
        let mut report = MatchReport::new(MatchTier::Direct, MatchOutcome::from_diff(&direct, settings.ignore_fields));
        debug!("{} tier for {}: matched={}", MatchTier::Direct, object.display_ref(), report.matched());
        if report.matched() {
            return Ok(report);
        }

        let simulated = self.dry_run(MatchTier::DryRunCreate, &manifest_node, dry_run_namespace)?;
        let outcome = masked_outcome(&object_node, &simulated, &masks, settings.ignore_fields);
        report.push(MatchTier::DryRunCreate, outcome);
        debug!("{} tier for {}: matched={}", MatchTier::DryRunCreate, object.display_ref(), report.matched());
        if report.matched() || !settings.allow_apply_simulation {
            return Ok(report);
        }

        let patch = self
            .simulator
            .apply_patch(manifest, object.namespace())
            .map_err(|e| MatchError::ApplyPatch(e.to_string()))?;
        let patched = Node::from_yaml_bytes(&patch.patched).map_err(MatchError::PatchedNode)?;
        let simulated = self.dry_run(MatchTier::DryRunApply, &patched, dry_run_namespace)?;
        let outcome = masked_outcome(&object_node, &simulated, &masks, settings.ignore_fields);
        report.push(MatchTier::DryRunApply, outcome);
        debug!("{} tier for {}: matched={}", MatchTier::DryRunApply, object.display_ref(), report.matched());

        Ok(report)
    }

    /// Dry-run creates `manifest` with its namespace removed.
    fn dry_run(&self, tier: MatchTier, manifest: &Node, namespace: Option<&str>) -> Result<Node, MatchError> {
        let bytes = manifest
            .mask(&[NAMESPACE_PATH])
            .to_yaml()
            .map_err(|source| MatchError::Encode { tier, source })?
            .into_bytes();

        let simulated = self
            .simulator
            .dry_run_create(&bytes, namespace)
            .map_err(|e| MatchError::DryRun {
                tier,
                message: e.to_string(),
            })?;

        Node::from_yaml_bytes(&simulated).map_err(|source| MatchError::SimulatedNode { tier, source })
    }
}

fn masked_outcome(object: &Node, simulated: &Node, masks: &[&str], ignore_fields: &[String]) -> MatchOutcome {
    let diff = object.mask(masks).diff(&simulated.mask(masks));
    MatchOutcome::from_diff(&diff, ignore_fields)
}
