//! Serializable views of document state.

use serde::Serialize;

use crate::history::Transaction;
use crate::node::{Node, NodeId};

/// Read-only copy of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: NodeId,
    pub label: String,
    pub weight: f64,
    pub collapsed: bool,
    pub children: Vec<NodeId>,
    pub child_count: usize,
    pub revision: u64,
}

impl From<&Node> for NodeView {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id(),
            label: node.label().to_string(),
            weight: node.weight(),
            collapsed: node.is_collapsed(),
            children: node.child_ids(),
            child_count: node.child_count(),
            revision: node.revision(),
        }
    }
}

/// Read-only copy of a whole document and its history depths.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentView {
    pub transaction: Transaction,
    pub undo_depth: usize,
    pub redo_depth: usize,
    pub nodes: Vec<NodeView>,
}

impl DocumentView {
    /// Finds a node view by id.
    pub fn node(&self, id: NodeId) -> Option<&NodeView> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
