//! Read-only scene graph consumed by the resolver and rebuilder.
//!
//! [`SceneQuery`] is the seam hosts implement over their own hierarchy (the
//! engine's transform tree, an ECS parent/child relation, ...). [`SceneGraph`]
//! is the in-memory arena implementation used by tests and tooling.

use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::ids::{IdAllocator, NodeId};

/// Queries the rebind pipeline needs from a scene hierarchy.
pub trait SceneQuery {
    fn name(&self, id: NodeId) -> Option<&str>;
    fn parent(&self, id: NodeId) -> Option<NodeId>;
    fn children(&self, id: NodeId) -> &[NodeId];
    fn node_count(&self) -> usize;

    /// Global lookup by exact name. May return an unrelated duplicate.
    fn find_node_by_name(&self, name: &str) -> Option<NodeId>;

    fn contains(&self, id: NodeId) -> bool {
        self.name(id).is_some()
    }

    /// Depth-first search below `scope` (exclusive). Direct children are
    /// checked before descending; the first exact match wins.
    fn find_descendant(&self, scope: NodeId, name: &str) -> Option<NodeId> {
        // explicit stack: host hierarchies can be deeper than the call stack
        let mut pending = vec![scope];
        while let Some(id) = pending.pop() {
            let children = self.children(id);
            if let Some(hit) = children
                .iter()
                .copied()
                .find(|c| self.name(*c) == Some(name))
            {
                return Some(hit);
            }
            pending.extend(children.iter().rev().copied());
        }
        None
    }

    /// Ancestor-chain walk. A node counts as a descendant of itself.
    fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        // bounded so a malformed host hierarchy cannot spin forever
        for _ in 0..=self.node_count() {
            match current {
                Some(id) if id == ancestor => return true,
                Some(id) => current = self.parent(id),
                None => return false,
            }
        }
        false
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Inactive nodes (and their subtrees) are invisible to global lookup.
    pub active: bool,
}

/// Arena-backed hierarchy. Node ids index directly into `nodes`.
#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    roots: Vec<NodeId>,
    ids: IdAllocator,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: &str, parent: Option<NodeId>) -> NodeId {
        let id = self.ids.alloc_node();
        debug_assert_eq!(id.index(), self.nodes.len());
        self.nodes.push(SceneNode {
            id,
            name: name.to_string(),
            parent,
            children: Vec::new(),
            active: true,
        });
        id
    }

    /// Add a top-level node.
    pub fn add_root(&mut self, name: &str) -> NodeId {
        let id = self.push(name, None);
        self.roots.push(id);
        id
    }

    /// Append a child under `parent`.
    pub fn add_child(&mut self, parent: NodeId, name: &str) -> Result<NodeId, SceneError> {
        if !self.contains(parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        let id = self.push(name, Some(parent));
        self.nodes[parent.index()].children.push(id);
        Ok(id)
    }

    pub fn set_active(&mut self, id: NodeId, active: bool) -> Result<(), SceneError> {
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(SceneError::UnknownNode(id))?;
        node.active = active;
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.index())
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Follow an absolute slash path from the top-level nodes, e.g. `"Rig/Arm/Hand"`.
    pub fn find_by_path(&self, path: &str) -> Option<NodeId> {
        let mut segments = path.split('/');
        let first = segments.next()?;
        let mut current = self
            .roots
            .iter()
            .copied()
            .find(|r| self.nodes[r.index()].name == first)?;
        for seg in segments {
            current = self.nodes[current.index()]
                .children
                .iter()
                .copied()
                .find(|c| self.nodes[c.index()].name == seg)?;
        }
        Some(current)
    }

    /// Slash path of `node` relative to `ancestor` (exclusive).
    /// Returns `None` when `ancestor` is not on the parent chain.
    pub fn path_from(&self, node: NodeId, ancestor: NodeId) -> Option<String> {
        if node == ancestor {
            return Some(String::new());
        }
        let mut names = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                names.reverse();
                return Some(names.join("/"));
            }
            let n = self.node(id)?;
            names.push(n.name.as_str());
            current = n.parent;
        }
        None
    }

    fn find_active(&self, from: NodeId, name: &str) -> Option<NodeId> {
        let mut pending = vec![from];
        while let Some(id) = pending.pop() {
            let node = &self.nodes[id.index()];
            if !node.active {
                continue;
            }
            if node.name == name {
                return Some(id);
            }
            pending.extend(node.children.iter().rev().copied());
        }
        None
    }

    pub fn from_document(doc: &SceneDocument) -> Self {
        let mut scene = SceneGraph::new();
        for root in &doc.roots {
            let id = scene.add_root(&root.name);
            scene.nodes[id.index()].active = root.active;
            scene.attach_children(id, &root.children);
        }
        scene
    }

    fn attach_children(&mut self, parent: NodeId, children: &[NodeDocument]) {
        // pre-order, so ids come out the same as a recursive walk
        let mut pending: Vec<(NodeId, &NodeDocument)> =
            children.iter().rev().map(|c| (parent, c)).collect();
        while let Some((parent, child)) = pending.pop() {
            let id = self.push(&child.name, Some(parent));
            self.nodes[parent.index()].children.push(id);
            self.nodes[id.index()].active = child.active;
            pending.extend(child.children.iter().rev().map(|c| (id, c)));
        }
    }

    pub fn to_document(&self) -> SceneDocument {
        SceneDocument {
            roots: self.roots.iter().map(|r| self.node_document(*r)).collect(),
        }
    }

    fn node_document(&self, id: NodeId) -> NodeDocument {
        let node = &self.nodes[id.index()];
        NodeDocument {
            name: node.name.clone(),
            active: node.active,
            children: node
                .children
                .iter()
                .map(|c| self.node_document(*c))
                .collect(),
        }
    }
}

impl SceneQuery for SceneGraph {
    fn name(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|n| n.name.as_str())
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn find_node_by_name(&self, name: &str) -> Option<NodeId> {
        self.roots.iter().find_map(|r| self.find_active(*r, name))
    }
}

fn default_active() -> bool {
    true
}

/// Nested JSON form of a scene: `{ "roots": [{ "name": "Rig", "children": [...] }] }`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub roots: Vec<NodeDocument>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub children: Vec<NodeDocument>,
}

/// Parse a [`SceneDocument`] JSON string into a [`SceneGraph`].
pub fn parse_scene_json(s: &str) -> Result<SceneGraph, SceneError> {
    let doc: SceneDocument = serde_json::from_str(s)?;
    Ok(SceneGraph::from_document(&doc))
}
