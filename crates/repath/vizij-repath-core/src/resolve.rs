//! Leaf-name resolution against a possibly ambiguous scene.
//!
//! Global lookup by name can land on a duplicate that lives outside the new
//! root (a second copy of the same rig, a prop sharing a bone name, ...). When
//! that happens and a parent scope is selected, resolution falls back to a
//! depth-first search restricted to that scope.

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::ids::NodeId;
use crate::scene::SceneQuery;

/// Last `/`-separated segment of a binding path (the whole path if it has no slash).
pub fn leaf_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// Selection driving a rebind. `new_root` is required by every rebind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebindRequest {
    pub new_root: Option<NodeId>,
    /// Narrows resolution when the leaf name exists more than once.
    pub optional_parent_scope: Option<NodeId>,
    /// Substitute target for bindings with an empty path.
    pub fill_node: Option<NodeId>,
}

impl RebindRequest {
    pub fn new(new_root: NodeId) -> Self {
        Self {
            new_root: Some(new_root),
            ..Self::default()
        }
    }

    pub fn with_scope(mut self, scope: NodeId) -> Self {
        self.optional_parent_scope = Some(scope);
        self
    }

    pub fn with_fill(mut self, fill: NodeId) -> Self {
        self.fill_node = Some(fill);
        self
    }
}

/// Where a name lookup searches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupStrategy {
    /// Whole scene, first active match.
    Global,
    /// Subtree of the given node only.
    Scoped(NodeId),
}

impl LookupStrategy {
    pub fn lookup<S: SceneQuery + ?Sized>(&self, scene: &S, name: &str) -> Option<NodeId> {
        match *self {
            LookupStrategy::Global => scene.find_node_by_name(name),
            LookupStrategy::Scoped(scope) => scene.find_descendant(scope, name),
        }
    }
}

/// Which path produced a resolved node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolvedBy {
    Fill,
    Global,
    Scoped,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Empty path without a fill node: the property lives on the root itself.
    RootProperty,
    Node {
        leaf: String,
        node: NodeId,
        via: ResolvedBy,
    },
}

/// Global lookup composed with an optional scoped fallback.
pub struct FallbackResolver<'a, S: SceneQuery + ?Sized> {
    scene: &'a S,
    new_root: NodeId,
    scope: Option<NodeId>,
}

impl<'a, S: SceneQuery + ?Sized> FallbackResolver<'a, S> {
    pub fn new(scene: &'a S, new_root: NodeId, scope: Option<NodeId>) -> Self {
        Self {
            scene,
            new_root,
            scope,
        }
    }

    /// Resolve a bare node name.
    ///
    /// Without a scope, a global hit outside the new root is returned as-is and
    /// left for the rebuilder to reject.
    pub fn resolve_name(&self, leaf: &str) -> Result<(NodeId, ResolvedBy), ResolveError> {
        let global = LookupStrategy::Global.lookup(self.scene, leaf);
        if let Some(node) = global {
            if self.scene.is_descendant_of(node, self.new_root) {
                return Ok((node, ResolvedBy::Global));
            }
        }
        match self.scope {
            Some(scope) => {
                log::debug!("'{leaf}': not found under the new root, searching {scope:?}");
                LookupStrategy::Scoped(scope)
                    .lookup(self.scene, leaf)
                    .map(|node| (node, ResolvedBy::Scoped))
                    .ok_or_else(|| ResolveError::NotFoundInScope {
                        leaf: leaf.to_string(),
                        scope,
                    })
            }
            None => global.map(|n| (n, ResolvedBy::Global)).ok_or_else(|| {
                ResolveError::MissingNode {
                    leaf: leaf.to_string(),
                }
            }),
        }
    }

    /// Map a binding path (plus optional fill node) to the node it should target.
    pub fn resolve_leaf(
        &self,
        path: &str,
        fill_node: Option<NodeId>,
    ) -> Result<Resolution, ResolveError> {
        if path.is_empty() {
            return Ok(match fill_node.and_then(|f| Some((f, self.scene.name(f)?))) {
                Some((node, name)) => Resolution::Node {
                    leaf: name.to_string(),
                    node,
                    via: ResolvedBy::Fill,
                },
                None => Resolution::RootProperty,
            });
        }
        let leaf = leaf_name(path);
        let (node, via) = self.resolve_name(leaf)?;
        Ok(Resolution::Node {
            leaf: leaf.to_string(),
            node,
            via,
        })
    }
}
