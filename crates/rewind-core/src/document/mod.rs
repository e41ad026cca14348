//! Document model combining a node graph with its undo history.
//!
//! A `Document` owns the graph, the `UndoSystem` that tracks it, and the
//! queue the system posts its commits to. Every edit records the objects it
//! is about to touch and then mutates them. Edits accumulate in one
//! transaction until `flush` drains the queue, which is what an event loop
//! does once the current input has been handled.

mod view;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{ensure, Context, Result};

use crate::graph::Graph;
use crate::history::{HistoryConfig, LocalQueue, Tracked, UndoSystem, Undoable};
use crate::node::{NodeId, NodeRef};
use crate::script::Command;

pub use view::{DocumentView, NodeView};

/// Erases a concrete tracked object to the engine's handle type.
fn as_tracked<T: Undoable + 'static>(object: &Rc<RefCell<T>>) -> Tracked {
    Rc::clone(object) as Tracked
}

/// A node graph with undo/redo.
#[derive(Debug)]
pub struct Document {
    graph: Rc<RefCell<Graph>>,
    history: UndoSystem,
    queue: LocalQueue,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl Document {
    /// Creates an empty document.
    pub fn new(config: HistoryConfig) -> Self {
        let (history, queue) = UndoSystem::with_local_queue(config);
        Self {
            graph: Rc::new(RefCell::new(Graph::new())),
            history,
            queue,
        }
    }

    /// The undo engine tracking this document.
    pub fn history(&self) -> &UndoSystem {
        &self.history
    }

    /// Looks up a live node.
    pub fn node(&self, id: NodeId) -> Option<NodeRef> {
        self.graph.borrow().get(id)
    }

    /// Live nodes in insertion order.
    pub fn nodes(&self) -> Vec<NodeRef> {
        self.graph.borrow().nodes().to_vec()
    }

    /// Change notifications received by the node registry.
    pub fn graph_revision(&self) -> u64 {
        self.graph.borrow().revision()
    }

    fn require(&self, id: NodeId) -> Result<NodeRef> {
        self.node(id).with_context(|| format!("Unknown node {id}"))
    }

    /// Adds a node and returns its id.
    pub fn add_node(&mut self, label: &str, weight: f64) -> Result<NodeId> {
        ensure!(weight.is_finite(), "Weight must be finite, got {weight}");
        self.history.record(&as_tracked(&self.graph), false)?;
        let id = self.graph.borrow_mut().insert_new(label, weight);
        tracing::debug!(%id, label, "Added node");
        Ok(id)
    }

    /// Changes a node's label.
    pub fn rename(&mut self, id: NodeId, label: &str) -> Result<()> {
        let node = self.require(id)?;
        self.history.record(&as_tracked(&node), false)?;
        node.borrow_mut().set_label(label);
        Ok(())
    }

    /// Changes a node's weight.
    pub fn set_weight(&mut self, id: NodeId, weight: f64) -> Result<()> {
        ensure!(weight.is_finite(), "Weight must be finite, got {weight}");
        let node = self.require(id)?;
        self.history.record(&as_tracked(&node), false)?;
        node.borrow_mut().set_weight(weight);
        Ok(())
    }

    /// Collapses or expands a node.
    ///
    /// This is a visual-only edit: right after a committed edit to the same
    /// node it does not get an undo step of its own.
    pub fn set_collapsed(&mut self, id: NodeId, collapsed: bool) -> Result<()> {
        let node = self.require(id)?;
        self.history.record(&as_tracked(&node), true)?;
        node.borrow_mut().set_collapsed(collapsed);
        Ok(())
    }

    /// Appends `child` to `parent`'s children.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        ensure!(parent != child, "Cannot attach node {parent} to itself");
        let parent_node = self.require(parent)?;
        let child_node = self.require(child)?;
        ensure!(
            !parent_node.borrow().has_child(child),
            "Node {child} is already a child of {parent}"
        );
        ensure!(
            !child_node.borrow().reaches(parent),
            "Attaching {child} under {parent} would create a cycle"
        );

        self.history.record(&as_tracked(&parent_node), false)?;
        parent_node.borrow_mut().push_child(child_node);
        Ok(())
    }

    /// Removes `child` from `parent`'s children.
    pub fn detach(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent_node = self.require(parent)?;
        ensure!(
            parent_node.borrow().has_child(child),
            "Node {child} is not a child of {parent}"
        );

        self.history.record(&as_tracked(&parent_node), false)?;
        parent_node.borrow_mut().remove_child(child);
        Ok(())
    }

    /// Removes a node from the document and from every parent that lists it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        self.require(id)?;
        let parents = self.graph.borrow().parents_of(id);

        self.history.record(&as_tracked(&self.graph), false)?;
        for parent in &parents {
            self.history.record(&as_tracked(parent), false)?;
            parent.borrow_mut().remove_child(id);
        }
        self.graph.borrow_mut().remove(id);
        tracing::debug!(%id, parents = parents.len(), "Removed node");
        Ok(())
    }

    /// Runs queued commits. Returns how many ran.
    pub fn flush(&self) -> usize {
        self.queue.run_pending()
    }

    /// Commits any open transaction, then undoes the last step.
    ///
    /// Returns `Ok(false)` if there was nothing to undo.
    pub fn undo(&mut self) -> Result<bool> {
        self.flush();
        self.history.undo()
    }

    /// Commits any open transaction, then redoes the last undone step.
    ///
    /// Returns `Ok(false)` if there was nothing to redo.
    pub fn redo(&mut self) -> Result<bool> {
        self.flush();
        self.history.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Applies one script command.
    pub fn apply(&mut self, command: &Command) -> Result<()> {
        match command {
            Command::Add { label, weight } => self.add_node(label, *weight).map(|_| ()),
            Command::Rename { id, label } => self.rename(*id, label),
            Command::SetWeight { id, weight } => self.set_weight(*id, *weight),
            Command::Collapse { id, collapsed } => self.set_collapsed(*id, *collapsed),
            Command::Attach { parent, child } => self.attach(*parent, *child),
            Command::Detach { parent, child } => self.detach(*parent, *child),
            Command::Remove { id } => self.remove_node(*id),
            Command::Commit => {
                self.flush();
                Ok(())
            }
            Command::Undo => {
                if !self.undo()? {
                    tracing::info!("Nothing to undo");
                }
                Ok(())
            }
            Command::Redo => {
                if !self.redo()? {
                    tracing::info!("Nothing to redo");
                }
                Ok(())
            }
        }
    }

    /// Applies every command in order, then commits.
    ///
    /// # Errors
    ///
    /// Stops at the first failing command. Edits recorded before the
    /// failure are still committed.
    pub fn run_script(&mut self, commands: &[Command]) -> Result<()> {
        let result = commands.iter().enumerate().try_for_each(|(index, command)| {
            self.apply(command)
                .with_context(|| format!("Command {index} ({}) failed", command.name()))
        });
        self.flush();
        result
    }

    /// Copies the current state into a serializable view.
    pub fn view(&self) -> DocumentView {
        DocumentView {
            transaction: self.history.transaction(),
            undo_depth: self.history.undo_depth(),
            redo_depth: self.history.redo_depth(),
            nodes: self
                .graph
                .borrow()
                .nodes()
                .iter()
                .map(|n| NodeView::from(&*n.borrow()))
                .collect(),
        }
    }
}
