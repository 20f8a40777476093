//! Pass 2: apply a [`RebindPlan`] to a clip.
//!
//! Each write creates the new entry before the old one is removed, and the old
//! one is only removed when the path actually changed. A failure on one
//! binding is reported and the batch continues.

use crate::clip::{ClipStore, CurveBinding, CurveKind};
use crate::config::RepathConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{RepathError, WriteError};
use crate::plan::{
    plan_clear_paths, plan_rebind, PlannedWrite, RebindPlan, RepathPhase, SkippedBinding,
};
use crate::resolve::{RebindRequest, ResolvedBy};
use crate::scene::SceneQuery;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovedBinding {
    pub from: CurveBinding,
    pub to: String,
    pub via: Option<ResolvedBy>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedWrite {
    pub binding: CurveBinding,
    pub error: WriteError,
}

/// What one rebind or clear invocation did to the clip.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ApplyReport {
    pub moved: Vec<MovedBinding>,
    /// Rewritten in place because the new path equals the old one.
    pub unchanged: usize,
    pub skipped: Vec<SkippedBinding>,
    pub failed: Vec<FailedWrite>,
    pub diagnostics: Diagnostics,
}

impl ApplyReport {
    /// Nothing moved and nothing failed.
    pub fn is_noop(&self) -> bool {
        self.moved.is_empty() && self.failed.is_empty()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum WriteOutcome {
    Moved,
    InPlace,
}

fn apply_write<C: ClipStore + ?Sized>(
    clip: &mut C,
    write: &PlannedWrite,
    verify: bool,
) -> Result<WriteOutcome, WriteError> {
    let payload = clip
        .curve(&write.binding)
        .ok_or_else(|| WriteError::MissingSource {
            path: write.binding.path.clone(),
        })?;
    let target = write.target();
    // a move only lands on a free key; the holder of a vacated key may have failed
    if !write.is_identity() && clip.curve(&target).is_some() {
        return Err(WriteError::TargetOccupied { path: target.path });
    }
    clip.set_curve(&target, Some(payload.clone()))?;
    if verify {
        match clip.curve(&target) {
            Some(stored) if stored.bit_eq(&payload) => {}
            _ => {
                return Err(WriteError::Unverified {
                    path: target.path,
                })
            }
        }
    }
    if write.is_identity() {
        return Ok(WriteOutcome::InPlace);
    }
    clip.set_curve(&write.binding, None)?;
    Ok(WriteOutcome::Moved)
}

/// Execute every planned write in order.
pub fn apply_plan<C: ClipStore + ?Sized>(
    clip: &mut C,
    plan: &RebindPlan,
    config: &RepathConfig,
) -> ApplyReport {
    log::debug!("{:?}: {}", plan.operation, RepathPhase::ApplyWrites);
    let mut report = ApplyReport {
        skipped: plan.skipped.clone(),
        diagnostics: plan.diagnostics.clone(),
        ..ApplyReport::default()
    };
    for write in &plan.writes {
        match apply_write(clip, write, config.verify_writes) {
            Ok(WriteOutcome::Moved) => report.moved.push(MovedBinding {
                from: write.binding.clone(),
                to: write.new_path.clone(),
                via: write.via,
            }),
            Ok(WriteOutcome::InPlace) => report.unchanged += 1,
            Err(error) => {
                report
                    .diagnostics
                    .error(&write.binding, format!("write failed: {error}"));
                report.failed.push(FailedWrite {
                    binding: write.binding.clone(),
                    error,
                });
            }
        }
    }
    log::debug!(
        "{:?}: {} moved, {} in place, {} skipped, {} failed; {}",
        plan.operation,
        report.moved.len(),
        report.unchanged,
        report.skipped.len(),
        report.failed.len(),
        RepathPhase::Idle
    );
    report
}

/// Plan and apply a rebind of every `kind` binding.
pub fn rebind<C, S>(
    clip: &mut C,
    scene: &S,
    request: &RebindRequest,
    kind: CurveKind,
    config: &RepathConfig,
) -> Result<ApplyReport, RepathError>
where
    C: ClipStore + ?Sized,
    S: SceneQuery + ?Sized,
{
    let plan = plan_rebind(&*clip, scene, request, kind, config)?;
    Ok(apply_plan(clip, &plan, config))
}

/// Plan and apply moving every binding to the empty path.
pub fn clear_paths<C: ClipStore + ?Sized>(clip: &mut C, config: &RepathConfig) -> ApplyReport {
    let plan = plan_clear_paths(&*clip);
    apply_plan(clip, &plan, config)
}
