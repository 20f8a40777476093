//! Error types for scene, clip and rebind operations.
//!
//! Only [`RepathError`] aborts an operation. Resolution and rebuild errors are
//! local to a single binding and end up as diagnostics on the plan.

use serde::{Deserialize, Serialize};

use crate::clip::CurveKind;
use crate::ids::NodeId;

/// Scene graph construction and lookup failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("unknown scene node {0:?}")]
    UnknownNode(NodeId),

    #[error("scene document parse error: {reason}")]
    Parse { reason: String },
}

/// Clip store write failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClipError {
    #[error("payload kind {payload:?} does not match binding kind {binding:?} for '{path}'")]
    KindMismatch {
        path: String,
        binding: CurveKind,
        payload: CurveKind,
    },

    #[error("malformed binding path '{path}'")]
    MalformedPath { path: String },

    #[error("clip document parse error: {reason}")]
    Parse { reason: String },
}

/// A leaf name that could not be mapped to a live node.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolveError {
    #[error("no active node named '{leaf}' in the scene")]
    MissingNode { leaf: String },

    #[error("no node named '{leaf}' under scope {scope:?}")]
    NotFoundInScope { leaf: String, scope: NodeId },
}

/// The parent walk stopped before reaching the new root.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebuildError {
    #[error("node is not under the new root (partial path '{partial}')")]
    OutsideRoot { partial: String },

    #[error("parent walk exceeded {max_depth} steps (partial path '{partial}')")]
    StructuralLoop { partial: String, max_depth: usize },
}

impl RebuildError {
    /// Best-effort path accumulated before the walk stopped.
    pub fn partial(&self) -> &str {
        match self {
            Self::OutsideRoot { partial } | Self::StructuralLoop { partial, .. } => partial,
        }
    }
}

/// A single planned write that could not be completed. The original entry is
/// never deleted once one of these has been raised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    #[error("no curve stored under '{path}' anymore")]
    MissingSource { path: String },

    #[error("curve written to '{path}' did not read back identical")]
    Unverified { path: String },

    #[error("'{path}' still holds a curve; an earlier move off it did not complete")]
    TargetOccupied { path: String },

    #[error(transparent)]
    Store(#[from] ClipError),
}

/// Operation-level failures; any of these means nothing was written.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RepathError {
    #[error("no animation clip selected")]
    MissingClip,

    #[error("no new root selected")]
    MissingRoot,

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Clip(#[from] ClipError),
}

impl RepathError {
    /// Error category for log grouping.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingClip | Self::MissingRoot => "input",
            Self::Scene(_) => "scene",
            Self::Clip(_) => "clip",
        }
    }
}

impl From<serde_json::Error> for SceneError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ClipError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}
