/// Change tracking, deferred commit, and the undo/redo stacks.
///
/// `record` is called right before a tracked object is mutated. The first
/// record of a burst opens a transaction and posts one commit task; every
/// later record in the same burst joins that transaction. When the task runs,
/// changed objects are notified and the captured snapshots become one batch
/// on the undo stack.
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use anyhow::{Context, Result};

use crate::batch::Batch;
use crate::config::HistoryConfig;
use crate::scheduler::{LocalQueue, Scheduler};
use crate::snapshot::{Snapshot, SnapshotCodec};
use crate::tracked::{Tracked, Transaction};

/// Engine state shared with the posted commit task.
#[derive(Default)]
struct State {
    /// The transaction clock.
    transaction: Transaction,
    /// Objects recorded in the open transaction, in first-recorded order.
    changed: Vec<Tracked>,
    /// Snapshots captured in the open transaction.
    pending: Vec<Snapshot>,
    /// Committed batches, newest last.
    undo: Vec<Batch>,
    /// Inverted batches, most recently undone last.
    redo: Vec<Batch>,
    codec: SnapshotCodec,
    config: HistoryConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Undo,
    Redo,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Undo => f.write_str("undo"),
            Direction::Redo => f.write_str("redo"),
        }
    }
}

/// Undo/redo engine for one object graph.
///
/// Owned by a single thread. The scheduler must be that thread's queue.
pub struct UndoSystem {
    state: Rc<RefCell<State>>,
    scheduler: Rc<dyn Scheduler>,
}

impl fmt::Debug for UndoSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("UndoSystem")
            .field("transaction", &state.transaction)
            .field("changed", &state.changed.len())
            .field("pending", &state.pending.len())
            .field("undo_depth", &state.undo.len())
            .field("redo_depth", &state.redo.len())
            .field("config", &state.config)
            .finish()
    }
}

impl UndoSystem {
    /// Creates an engine that posts its commits to `scheduler`.
    pub fn new(config: HistoryConfig, scheduler: Rc<dyn Scheduler>) -> Self {
        let state = State {
            config,
            ..State::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            scheduler,
        }
    }

    /// Creates an engine backed by a fresh `LocalQueue`.
    ///
    /// The returned queue must be drained by the caller for transactions to
    /// commit.
    pub fn with_local_queue(config: HistoryConfig) -> (Self, LocalQueue) {
        let queue = LocalQueue::new();
        let system = Self::new(config, Rc::new(queue.clone()));
        (system, queue)
    }

    /// Current value of the transaction clock.
    pub fn transaction(&self) -> Transaction {
        self.state.borrow().transaction
    }

    /// Whether records have been made that are not yet committed.
    pub fn is_transaction_open(&self) -> bool {
        !self.state.borrow().changed.is_empty()
    }

    /// Records that `target` is about to change.
    ///
    /// Must be called before the mutation so the captured snapshot holds
    /// the previous state. Recording an object again in the same
    /// transaction does nothing. A `visual_only` change to an object that
    /// the last committed undo step already covers is notified but not
    /// snapshotted.
    ///
    /// # Errors
    ///
    /// Returns an error if the object's `capture` fails. The object still
    /// counts as changed and is notified at commit.
    pub fn record(&mut self, target: &Tracked, visual_only: bool) -> Result<()> {
        self.open_transaction_if_idle();

        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let current = state.transaction;
        if target.borrow().stamp() == current {
            return Ok(());
        }

        state.changed.push(Rc::clone(target));
        target.borrow_mut().set_stamp(current);

        if visual_only && state.undo.last().is_some_and(|top| top.contains(target)) {
            tracing::trace!(
                transaction = current,
                "Visual-only change already covered by the last undo step"
            );
            return Ok(());
        }

        let snapshot = state
            .codec
            .capture(target)
            .with_context(|| format!("Failed to record change in transaction {current}"))?;
        state.pending.push(snapshot);
        Ok(())
    }

    /// Reverts the most recent undo step.
    ///
    /// Returns `Ok(false)` if there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns an error if an object in the step fails to capture or
    /// restore. The step is dropped from history in that case.
    pub fn undo(&mut self) -> Result<bool> {
        self.step(Direction::Undo)
    }

    /// Re-applies the most recently undone step.
    ///
    /// Returns `Ok(false)` if there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Same as [`UndoSystem::undo`].
    pub fn redo(&mut self) -> Result<bool> {
        self.step(Direction::Redo)
    }

    /// Whether there is a step to undo.
    pub fn can_undo(&self) -> bool {
        !self.state.borrow().undo.is_empty()
    }

    /// Whether there is a step to redo.
    pub fn can_redo(&self) -> bool {
        !self.state.borrow().redo.is_empty()
    }

    /// Number of steps on the undo stack.
    pub fn undo_depth(&self) -> usize {
        self.state.borrow().undo.len()
    }

    /// Number of steps on the redo stack.
    pub fn redo_depth(&self) -> usize {
        self.state.borrow().redo.len()
    }

    /// Snapshots captured in the open transaction so far.
    pub fn pending_len(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Copy of the step `undo` would revert next.
    pub fn peek_undo(&self) -> Option<Batch> {
        self.state.borrow().undo.last().cloned()
    }

    /// Copy of the step `redo` would re-apply next.
    pub fn peek_redo(&self) -> Option<Batch> {
        self.state.borrow().redo.last().cloned()
    }

    /// Returns the history configuration.
    pub fn config(&self) -> HistoryConfig {
        self.state.borrow().config.clone()
    }

    /// Drops both stacks and any snapshots captured in the open transaction.
    ///
    /// An open transaction still commits and notifies its objects. The
    /// clock is not reset.
    pub fn clear(&mut self) {
        let mut state = self.state.borrow_mut();
        state.undo.clear();
        state.redo.clear();
        state.pending.clear();
        tracing::debug!(transaction = state.transaction, "Cleared undo history");
    }

    fn open_transaction_if_idle(&self) {
        let transaction = {
            let mut state = self.state.borrow_mut();
            if !state.changed.is_empty() {
                return;
            }
            state.transaction += 1;
            state.transaction
        };
        tracing::debug!(transaction, "Opened transaction");

        let state: Weak<RefCell<State>> = Rc::downgrade(&self.state);
        self.scheduler.post(Box::new(move || {
            // The engine may have been dropped before the queue drained.
            if let Some(state) = state.upgrade() {
                commit(&state, transaction);
            }
        }));
    }

    fn step(&mut self, direction: Direction) -> Result<bool> {
        let (mut batch, mut codec, stamp) = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let source = match direction {
                Direction::Undo => &mut state.undo,
                Direction::Redo => &mut state.redo,
            };
            let Some(batch) = source.pop() else {
                return Ok(false);
            };
            state.transaction += 1;
            (batch, std::mem::take(&mut state.codec), state.transaction)
        };

        // Not borrowed while hooks run: they may record follow-up changes.
        let result = batch.invert(&mut codec, stamp);

        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.codec = codec;
        match result {
            Ok(()) => {
                tracing::debug!(
                    transaction = stamp,
                    snapshots = batch.len(),
                    "Applied {direction}"
                );
                match direction {
                    Direction::Undo => state.redo.push(batch),
                    Direction::Redo => state.undo.push(batch),
                }
                Ok(true)
            }
            Err(e) => {
                tracing::error!("Failed to {direction} in transaction {stamp}: {e:#}");
                Err(e.context(format!("Failed to {direction}")))
            }
        }
    }
}

/// Finalizes one transaction. Runs once, from the posted task.
fn commit(state: &RefCell<State>, transaction: Transaction) {
    // A hook may record further objects. The transaction stays open while
    // `changed` is non-empty, so they join this batch and are notified too.
    let mut notified = 0;
    loop {
        let next = state.borrow().changed.get(notified).cloned();
        let Some(target) = next else {
            break;
        };
        target.borrow_mut().on_changed();
        notified += 1;
    }

    let (changed, pending) = {
        let mut state = state.borrow_mut();
        (
            std::mem::take(&mut state.changed),
            std::mem::take(&mut state.pending),
        )
    };

    let mut guard = state.borrow_mut();
    let state = &mut *guard;
    if pending.is_empty() {
        tracing::debug!(
            transaction,
            notified = changed.len(),
            "Committed transaction without an undo step"
        );
        return;
    }

    let batch = Batch::new(pending);
    tracing::debug!(
        transaction,
        snapshots = batch.len(),
        notified = changed.len(),
        "Committed undo step"
    );
    state.undo.push(batch);
    state.redo.clear();

    let excess = state.config.excess(state.undo.len());
    if excess > 0 {
        state.undo.drain(..excess);
        tracing::debug!(dropped = excess, "Dropped oldest undo steps");
    }
}
