//! Sparse data-structure node registry.
//!
//! The registry is read-only from the engine's point of view: it supplies
//! parent/ancestor traversal for dirty-flag propagation and identifies the
//! structural root, which acts as the propagation boundary.

use std::fmt;

/// Identifier of a node in the sparse data-structure tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Structural role of a node in the sparse tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Dense,
    Pointer,
    Dynamic,
    Bitmasked,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
}

/// Arena of sparse data-structure nodes with a single structural root.
///
/// Nodes are appended once during program setup and never removed, so
/// `NodeId`s stay valid for the lifetime of the tree.
#[derive(Debug, Clone)]
pub struct NodeTree {
    nodes: Vec<NodeData>,
}

impl NodeTree {
    /// Create a tree containing only the structural root.
    pub fn new() -> Self {
        Self { nodes: vec![NodeData { kind: NodeKind::Root, parent: None }] }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a child node under `parent`.
    pub fn add_child(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData { kind, parent: Some(parent) });
        id
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.0 as usize].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0 as usize].parent
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Root)
    }

    /// Walk from `id` toward the root, yielding `id` itself first.
    pub fn self_and_ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), |&n| self.parent(n))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}
