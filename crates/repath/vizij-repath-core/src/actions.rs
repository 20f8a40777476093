//! The four user-facing actions, independent of any window toolkit.
//!
//! Hosts keep a [`Selection`] (whatever the user picked as new root, parent
//! scope and fill node) and call [`Repather::run`] when a button fires.

use serde::{Deserialize, Serialize};

use crate::clip::{ClipStore, CurveKind};
use crate::config::RepathConfig;
use crate::error::RepathError;
use crate::ids::NodeId;
use crate::resolve::RebindRequest;
use crate::scene::SceneQuery;
use crate::writer::{clear_paths, rebind, ApplyReport};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub new_root: Option<NodeId>,
    pub optional_parent: Option<NodeId>,
    pub fill_node: Option<NodeId>,
}

impl Selection {
    pub fn request(&self) -> RebindRequest {
        RebindRequest {
            new_root: self.new_root,
            optional_parent_scope: self.optional_parent,
            fill_node: self.fill_node,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    RebindValueCurves,
    RebindObjectReferenceCurves,
    ClearPaths,
    ToggleHelp,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ActionOutcome {
    Applied(ApplyReport),
    HelpToggled { visible: bool },
}

const INSTRUCTIONS: &str = "\
Usage:
- Select the clip to edit. Work on a copy if you may want to undo the result.
- Select the new root: the node the clip will be played from (usually the object holding the armature).
- Select an optional parent when the scene holds duplicate or similar rigs; bones are then looked up under it.
- Select a fill node to give bindings with an empty path (properties on the root) an explicit target.
- Rebind Value Curves rewrites the paths of numeric curves under the new root.
- Rebind Object-Reference Curves does the same for object-reference curves.
- Clear Paths moves every curve of both kinds to the empty path.
Notes:
- Bone names must be unique under the rig.
- Inactive nodes cannot be found by the global lookup; use an optional parent to reach them.
- A binding that cannot be resolved under the new root is left unchanged and reported.
";

/// Help/notes text shown by the Toggle Help action.
pub fn instructions() -> &'static str {
    INSTRUCTIONS
}

/// Action dispatcher holding the only UI-adjacent state the core cares about.
#[derive(Clone, Debug, Default)]
pub struct Repather {
    pub config: RepathConfig,
    show_help: bool,
}

impl Repather {
    pub fn new(config: RepathConfig) -> Self {
        Self {
            config,
            show_help: false,
        }
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    /// Run one action to completion. Missing clip or root aborts before any read.
    pub fn run<C, S>(
        &mut self,
        action: Action,
        clip: Option<&mut C>,
        scene: &S,
        selection: &Selection,
    ) -> Result<ActionOutcome, RepathError>
    where
        C: ClipStore + ?Sized,
        S: SceneQuery + ?Sized,
    {
        log::debug!("action {action:?}");
        let kind = match action {
            Action::ToggleHelp => {
                self.show_help = !self.show_help;
                return Ok(ActionOutcome::HelpToggled {
                    visible: self.show_help,
                });
            }
            Action::ClearPaths => {
                let clip = clip.ok_or(RepathError::MissingClip)?;
                return Ok(ActionOutcome::Applied(clear_paths(clip, &self.config)));
            }
            Action::RebindValueCurves => CurveKind::Value,
            Action::RebindObjectReferenceCurves => CurveKind::ObjectReference,
        };
        let clip = clip.ok_or(RepathError::MissingClip)?;
        let report = rebind(clip, scene, &selection.request(), kind, &self.config)?;
        Ok(ActionOutcome::Applied(report))
    }
}
