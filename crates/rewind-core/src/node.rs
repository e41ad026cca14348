/// Graph nodes, the tracked objects of the document model.
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::history::{Handle, SnapshotReader, SnapshotWriter, Transaction, Undoable};

/// Stable identifier of a node. Never reused within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared handle to a node.
pub type NodeRef = Rc<RefCell<Node>>;

/// A labelled, weighted node with ordered children.
pub struct Node {
    id: NodeId,
    label: String,
    weight: f64,
    /// Display-only state; changing it is a visual-only edit.
    collapsed: bool,
    children: Vec<NodeRef>,
    /// Derived from `children`, rebuilt after undo/redo.
    child_count: usize,
    /// Bumped on every change notification.
    revision: u64,
    stamp: Transaction,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("weight", &self.weight)
            .field("collapsed", &self.collapsed)
            .field("children", &self.child_ids())
            .field("revision", &self.revision)
            .finish()
    }
}

impl Node {
    /// Creates a detached node.
    pub fn new(id: NodeId, label: &str, weight: f64) -> Self {
        Self {
            id,
            label: label.to_string(),
            weight,
            collapsed: false,
            children: Vec::new(),
            child_count: 0,
            revision: 0,
            stamp: 0,
        }
    }

    /// Creates a detached node behind a shared handle.
    pub fn new_ref(id: NodeId, label: &str, weight: f64) -> NodeRef {
        Rc::new(RefCell::new(Self::new(id, label, weight)))
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Ids of the direct children, in order.
    pub fn child_ids(&self) -> Vec<NodeId> {
        self.children.iter().map(|c| c.borrow().id).collect()
    }

    /// Cached number of children.
    pub fn child_count(&self) -> usize {
        self.child_count
    }

    /// Number of change notifications received.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether `id` is a direct child.
    pub fn has_child(&self, id: NodeId) -> bool {
        self.children.iter().any(|c| c.borrow().id == id)
    }

    /// Whether `id` is this node or any of its descendants.
    pub fn reaches(&self, id: NodeId) -> bool {
        self.id == id || self.children.iter().any(|c| c.borrow().reaches(id))
    }

    pub(crate) fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
    }

    pub(crate) fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub(crate) fn set_collapsed(&mut self, collapsed: bool) {
        self.collapsed = collapsed;
    }

    pub(crate) fn push_child(&mut self, child: NodeRef) {
        self.children.push(child);
        self.child_count = self.children.len();
    }

    /// Removes the child with `id`. Returns whether it was present.
    pub(crate) fn remove_child(&mut self, id: NodeId) -> bool {
        let before = self.children.len();
        self.children.retain(|c| c.borrow().id != id);
        self.child_count = self.children.len();
        self.children.len() != before
    }
}

impl Undoable for Node {
    fn stamp(&self) -> Transaction {
        self.stamp
    }

    fn set_stamp(&mut self, stamp: Transaction) {
        self.stamp = stamp;
    }

    fn capture(&self, writer: &mut SnapshotWriter) -> Result<()> {
        writer.write(&self.label)?;
        writer.write(&self.weight)?;
        writer.write(&self.collapsed)?;
        let count = u32::try_from(self.children.len())
            .with_context(|| format!("Node {} has too many children", self.id))?;
        writer.write(&count)?;
        writer.write_handles(self.children.iter().map(|c| Rc::clone(c) as Handle));
        Ok(())
    }

    fn restore(&mut self, reader: &mut SnapshotReader<'_>) -> Result<()> {
        self.label = reader.read()?;
        self.weight = reader.read()?;
        self.collapsed = reader.read()?;
        let count: u32 = reader.read()?;
        self.children = (0..count)
            .map(|_| reader.read_handle_as::<RefCell<Node>>())
            .collect::<Result<_>>()?;
        Ok(())
    }

    fn after_restore(&mut self) {
        self.child_count = self.children.len();
    }

    fn on_changed(&mut self) {
        self.revision += 1;
        tracing::trace!(id = %self.id, revision = self.revision, "Node changed");
    }
}
