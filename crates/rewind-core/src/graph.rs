/// The document's node registry.
use std::cell::RefCell;

use anyhow::Result;

use crate::history::{Handle, SnapshotReader, SnapshotWriter, Transaction, Undoable};
use crate::node::{Node, NodeId, NodeRef};

/// Ordered set of the nodes that belong to a document.
///
/// The node list is tracked like any other object, so adding and removing
/// nodes undoes the same way field edits do.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<NodeRef>,
    /// Ids are never reused, so the counter is not part of the snapshot.
    next_id: u32,
    revision: u64,
    stamp: Transaction,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[NodeRef] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a live node by id.
    pub fn get(&self, id: NodeId) -> Option<NodeRef> {
        self.nodes.iter().find(|n| n.borrow().id() == id).cloned()
    }

    /// Live nodes that list `id` as a direct child.
    pub fn parents_of(&self, id: NodeId) -> Vec<NodeRef> {
        self.nodes
            .iter()
            .filter(|n| n.borrow().has_child(id))
            .cloned()
            .collect()
    }

    /// Number of change notifications received.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Creates a node with a fresh id and appends it.
    pub(crate) fn insert_new(&mut self, label: &str, weight: f64) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.push(Node::new_ref(id, label, weight));
        id
    }

    /// Removes the node with `id` from the registry.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<NodeRef> {
        let index = self.nodes.iter().position(|n| n.borrow().id() == id)?;
        Some(self.nodes.remove(index))
    }
}

impl Undoable for Graph {
    fn stamp(&self) -> Transaction {
        self.stamp
    }

    fn set_stamp(&mut self, stamp: Transaction) {
        self.stamp = stamp;
    }

    fn capture(&self, writer: &mut SnapshotWriter) -> Result<()> {
        writer.write_handles(self.nodes.iter().map(|n| NodeRef::clone(n) as Handle));
        Ok(())
    }

    fn restore(&mut self, reader: &mut SnapshotReader<'_>) -> Result<()> {
        let count = reader.remaining_handles();
        self.nodes = (0..count)
            .map(|_| reader.read_handle_as::<RefCell<Node>>())
            .collect::<Result<_>>()?;
        Ok(())
    }

    fn on_changed(&mut self) {
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use rewind_mod_history::SnapshotCodec;

    use super::*;
    use crate::history::Tracked;

    #[test]
    fn test_ids_are_not_reused() {
        let mut graph = Graph::new();
        let a = graph.insert_new("a", 0.0);
        let b = graph.insert_new("b", 0.0);
        assert!(graph.remove(b).is_some());
        let c = graph.insert_new("c", 0.0);
        assert_eq!((a, b, c), (NodeId(0), NodeId(1), NodeId(2)));
        assert_eq!(graph.len(), 2);
        assert!(graph.get(b).is_none());
    }

    #[test]
    fn test_parents_of() {
        let mut graph = Graph::new();
        let a = graph.insert_new("a", 0.0);
        let b = graph.insert_new("b", 0.0);
        let c = graph.insert_new("c", 0.0);
        let child = graph.get(c).expect("c");
        graph.get(a).expect("a").borrow_mut().push_child(Rc::clone(&child));
        graph.get(b).expect("b").borrow_mut().push_child(child);

        let parents: Vec<NodeId> = graph
            .parents_of(c)
            .iter()
            .map(|n| n.borrow().id())
            .collect();
        assert_eq!(parents, vec![a, b]);
        assert!(graph.parents_of(a).is_empty());
    }

    #[test]
    fn test_snapshot_holds_only_handles() {
        let graph = Rc::new(RefCell::new(Graph::new()));
        graph.borrow_mut().insert_new("a", 0.0);
        graph.borrow_mut().insert_new("b", 0.0);
        let tracked: Tracked = graph.clone();

        let mut codec = SnapshotCodec::new();
        let snapshot = codec.capture(&tracked).expect("capture");
        assert!(snapshot.data().is_none());
        assert_eq!(snapshot.references().map(<[Handle]>::len), Some(2));

        graph.borrow_mut().remove(NodeId(0));
        graph.borrow_mut().insert_new("c", 0.0);
        SnapshotCodec::restore(&snapshot).expect("restore");

        let ids: Vec<NodeId> = graph
            .borrow()
            .nodes()
            .iter()
            .map(|n| n.borrow().id())
            .collect();
        assert_eq!(ids, vec![NodeId(0), NodeId(1)]);
    }

    #[test]
    fn test_empty_graph_snapshot_is_empty() {
        let tracked: Tracked = Rc::new(RefCell::new(Graph::new()));
        let mut codec = SnapshotCodec::new();
        let snapshot = codec.capture(&tracked).expect("capture");
        assert!(snapshot.data().is_none());
        assert!(snapshot.references().is_none());
    }
}
