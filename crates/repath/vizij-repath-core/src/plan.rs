//! Pass 1: compute every binding's new path without touching the clip.
//!
//! The plan is a pure function of the clip snapshot and the scene. Writes are
//! ordered so that a binding moving onto another binding's old key only runs
//! after that binding has moved away; keys that would be overwritten while still
//! in use are rejected here instead of being clobbered in pass 2.

use std::fmt;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::clip::{list_bindings, ClipStore, CurveBinding, CurveKind};
use crate::config::{OutsideRootPolicy, RepathConfig};
use crate::diagnostics::{Diagnostics, Severity};
use crate::error::{RebuildError, RepathError, ResolveError, SceneError};
use crate::rebuild::build_path;
use crate::resolve::{FallbackResolver, RebindRequest, Resolution, ResolvedBy};
use crate::scene::SceneQuery;

/// Per-invocation state machine, surfaced in logs.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RepathPhase {
    Idle,
    EnumerateBindings,
    ComputeNewPaths,
    ApplyWrites,
}

impl fmt::Display for RepathPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RepathPhase::Idle => "idle",
            RepathPhase::EnumerateBindings => "enumerate-bindings",
            RepathPhase::ComputeNewPaths => "compute-new-paths",
            RepathPhase::ApplyWrites => "apply-writes",
        };
        f.write_str(s)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlanOperation {
    Rebind(CurveKind),
    ClearPaths,
}

/// One binding moving (or rewriting in place) to `new_path`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedWrite {
    pub binding: CurveBinding,
    pub new_path: String,
    /// How the target node was found; `None` for Clear Paths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<ResolvedBy>,
}

impl PlannedWrite {
    pub fn new(binding: CurveBinding, new_path: impl Into<String>) -> Self {
        Self {
            binding,
            new_path: new_path.into(),
            via: None,
        }
    }

    pub fn resolved_by(mut self, via: ResolvedBy) -> Self {
        self.via = Some(via);
        self
    }

    /// Binding key the payload lands on.
    pub fn target(&self) -> CurveBinding {
        self.binding.with_path(self.new_path.as_str())
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        self.binding.path == self.new_path
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// Empty path and no fill node; stays on the root.
    RootProperty,
    Unresolved(ResolveError),
    Rebuild(RebuildError),
    /// Target key already claimed, or held by a binding that stays put.
    PathCollision { path: String },
    /// Part of (or waiting on) a chain of moves that loops back on itself.
    MoveCycle { path: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedBinding {
    pub binding: CurveBinding,
    pub reason: SkipReason,
}

/// Output of pass 1. `writes` are in apply order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RebindPlan {
    pub operation: PlanOperation,
    pub writes: Vec<PlannedWrite>,
    pub skipped: Vec<SkippedBinding>,
    pub diagnostics: Diagnostics,
}

impl RebindPlan {
    /// Writes that actually change a path.
    pub fn moves(&self) -> impl Iterator<Item = &PlannedWrite> {
        self.writes.iter().filter(|w| !w.is_identity())
    }

    pub fn new_path_of(&self, binding: &CurveBinding) -> Option<&str> {
        self.writes
            .iter()
            .find(|w| &w.binding == binding)
            .map(|w| w.new_path.as_str())
    }
}

/// Compute new paths for every `kind` binding of `clip`.
///
/// Missing or unknown selection nodes abort before any binding is read.
/// Per-binding failures are recorded as skips and never abort the batch.
pub fn plan_rebind<C, S>(
    clip: &C,
    scene: &S,
    request: &RebindRequest,
    kind: CurveKind,
    config: &RepathConfig,
) -> Result<RebindPlan, RepathError>
where
    C: ClipStore + ?Sized,
    S: SceneQuery + ?Sized,
{
    let new_root = request.new_root.ok_or(RepathError::MissingRoot)?;
    for id in [
        Some(new_root),
        request.optional_parent_scope,
        request.fill_node,
    ]
    .into_iter()
    .flatten()
    {
        if !scene.contains(id) {
            return Err(SceneError::UnknownNode(id).into());
        }
    }

    log::debug!("rebind {kind:?}: {}", RepathPhase::EnumerateBindings);
    let bindings = list_bindings(clip, kind);

    log::debug!("rebind {kind:?}: {}", RepathPhase::ComputeNewPaths);
    let resolver = FallbackResolver::new(scene, new_root, request.optional_parent_scope);
    let mut diagnostics = Diagnostics::new();
    let mut skipped = Vec::new();
    let mut proposals = Vec::with_capacity(bindings.len());

    for binding in &bindings {
        let (node, via) = match resolver.resolve_leaf(&binding.path, request.fill_node) {
            Ok(Resolution::Node { leaf, node, via }) => {
                log::trace!("'{}': leaf '{leaf}' resolved {via:?}", binding.path);
                (node, via)
            }
            Ok(Resolution::RootProperty) => {
                skipped.push(SkippedBinding {
                    binding: binding.clone(),
                    reason: SkipReason::RootProperty,
                });
                continue;
            }
            Err(err) => {
                diagnostics.warn(binding, format!("left unchanged: {err}"));
                skipped.push(SkippedBinding {
                    binding: binding.clone(),
                    reason: SkipReason::Unresolved(err),
                });
                continue;
            }
        };
        match build_path(scene, node, new_root, config.max_depth) {
            Ok(new_path) => {
                proposals.push(PlannedWrite::new(binding.clone(), new_path).resolved_by(via))
            }
            Err(err) => match config.outside_root {
                OutsideRootPolicy::Skip => {
                    diagnostics.error(binding, format!("left unchanged: {err}"));
                    skipped.push(SkippedBinding {
                        binding: binding.clone(),
                        reason: SkipReason::Rebuild(err),
                    });
                }
                OutsideRootPolicy::BestEffort => {
                    diagnostics.warn(binding, format!("using partial path: {err}"));
                    let write = PlannedWrite::new(binding.clone(), err.partial());
                    proposals.push(write.resolved_by(via));
                }
            },
        }
    }

    let writes = order_writes(&bindings, proposals, &mut skipped, &mut diagnostics);
    Ok(RebindPlan {
        operation: PlanOperation::Rebind(kind),
        writes,
        skipped,
        diagnostics,
    })
}

/// Move every binding of both kinds to the empty path.
pub fn plan_clear_paths<C: ClipStore + ?Sized>(clip: &C) -> RebindPlan {
    log::debug!("clear paths: {}", RepathPhase::EnumerateBindings);
    let mut bindings = list_bindings(clip, CurveKind::Value);
    bindings.extend(list_bindings(clip, CurveKind::ObjectReference));

    log::debug!("clear paths: {}", RepathPhase::ComputeNewPaths);
    let proposals = bindings
        .iter()
        .map(|b| PlannedWrite::new(b.clone(), ""))
        .collect();
    let mut skipped = Vec::new();
    let mut diagnostics = Diagnostics::new();
    let writes = order_writes(&bindings, proposals, &mut skipped, &mut diagnostics);
    RebindPlan {
        operation: PlanOperation::ClearPaths,
        writes,
        skipped,
        diagnostics,
    }
}

fn skip(
    skipped: &mut Vec<SkippedBinding>,
    diagnostics: &mut Diagnostics,
    write: PlannedWrite,
    reason: SkipReason,
    message: String,
) {
    diagnostics.push(Severity::Warning, Some(&write.binding), message);
    skipped.push(SkippedBinding {
        binding: write.binding,
        reason,
    });
}

/// Reject colliding targets and order moves so no live key is overwritten.
fn order_writes(
    existing: &[CurveBinding],
    proposals: Vec<PlannedWrite>,
    skipped: &mut Vec<SkippedBinding>,
    diagnostics: &mut Diagnostics,
) -> Vec<PlannedWrite> {
    let existing: HashSet<&CurveBinding> = existing.iter().collect();

    // bindings already in place own their key; otherwise the first claim wins
    let mut claimed: HashSet<CurveBinding> = proposals
        .iter()
        .filter(|w| w.is_identity())
        .map(|w| w.binding.clone())
        .collect();
    let mut accepted: Vec<PlannedWrite> = Vec::with_capacity(proposals.len());
    for write in proposals {
        if write.is_identity() || claimed.insert(write.target()) {
            accepted.push(write);
        } else {
            let path = write.new_path.clone();
            let message = format!("left unchanged: '{path}' is already another binding's target");
            let reason = SkipReason::PathCollision { path };
            skip(skipped, diagnostics, write, reason, message);
        }
    }

    // a target held by a binding that stays put would be overwritten; dropping
    // a move can pin another key, so repeat until stable
    loop {
        let blocked = {
            let moving: HashSet<&CurveBinding> = accepted
                .iter()
                .filter(|w| !w.is_identity())
                .map(|w| &w.binding)
                .collect();
            accepted.iter().position(|w| {
                let target = w.target();
                !w.is_identity() && existing.contains(&target) && !moving.contains(&target)
            })
        };
        let Some(i) = blocked else { break };
        let write = accepted.remove(i);
        let path = write.new_path.clone();
        let message = format!("left unchanged: '{path}' is held by a binding that is not moving");
        skip(skipped, diagnostics, write, SkipReason::PathCollision { path }, message);
    }

    // a move onto another binding's old key waits for that binding to move
    let origin: HashMap<CurveBinding, usize> = accepted
        .iter()
        .enumerate()
        .filter(|(_, w)| !w.is_identity())
        .map(|(i, w)| (w.binding.clone(), i))
        .collect();
    let deps: Vec<Option<usize>> = accepted
        .iter()
        .map(|w| {
            if w.is_identity() {
                None
            } else {
                origin.get(&w.target()).copied()
            }
        })
        .collect();

    let mut done = vec![false; accepted.len()];
    let mut order = Vec::with_capacity(accepted.len());
    loop {
        let mut progressed = false;
        for i in 0..accepted.len() {
            if done[i] {
                continue;
            }
            if deps[i].map_or(true, |d| done[d]) {
                done[i] = true;
                order.push(i);
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    let mut slots: Vec<Option<PlannedWrite>> = accepted.into_iter().map(Some).collect();
    let mut writes = Vec::with_capacity(order.len());
    for i in order {
        if let Some(w) = slots[i].take() {
            writes.push(w);
        }
    }
    for write in slots.into_iter().flatten() {
        let path = write.new_path.clone();
        let message = format!("left unchanged: moving to '{path}' would loop through other moves");
        skip(skipped, diagnostics, write, SkipReason::MoveCycle { path }, message);
    }
    writes
}
