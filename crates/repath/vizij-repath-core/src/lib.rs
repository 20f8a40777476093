//! Vizij Repath Core (engine-agnostic)
//!
//! Rewrites the hierarchy paths of animation curve bindings so a clip plays on
//! a new root. Hosts plug their clip storage and scene hierarchy in through
//! [`ClipStore`] and [`SceneQuery`]; everything else is pure data flow:
//!
//! enumerate bindings → resolve each leaf name → rebuild its path under the
//! new root → apply all writes, new entry before old one removed.
//!
//! Path computation for the whole clip happens before the first write, so a
//! resolution problem never leaves the clip half-rewritten.

pub mod actions;
pub mod clip;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod ids;
pub mod plan;
pub mod rebuild;
pub mod resolve;
pub mod scene;
pub mod writer;

// Re-exports for consumers (adapters)
pub use actions::{instructions, Action, ActionOutcome, Repather, Selection};
pub use clip::{
    list_bindings, parse_clip_json, summarize, AnimationClip, BindingSummary, ClipStore,
    CurveBinding, CurveKind, CurvePayload, Keyframe, ObjectKeyframe,
};
pub use config::{OutsideRootPolicy, RepathConfig};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{ClipError, RebuildError, RepathError, ResolveError, SceneError, WriteError};
pub use ids::NodeId;
pub use plan::{plan_clear_paths, plan_rebind, PlannedWrite, RebindPlan, SkipReason};
pub use rebuild::build_path;
pub use resolve::{
    leaf_name, FallbackResolver, LookupStrategy, RebindRequest, Resolution, ResolvedBy,
};
pub use scene::{parse_scene_json, SceneGraph, SceneQuery};
pub use writer::{apply_plan, clear_paths, rebind, ApplyReport, FailedWrite, MovedBinding};
