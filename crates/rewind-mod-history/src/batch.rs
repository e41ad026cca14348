/// A committed undo step: every snapshot captured during one transaction.
use anyhow::{Context, Result};

use crate::snapshot::{Snapshot, SnapshotCodec};
use crate::tracked::{Tracked, Transaction};

/// Ordered group of snapshots that undo and redo as one step.
///
/// Order is the order in which objects were first recorded. Each object
/// appears at most once.
#[derive(Debug, Clone)]
pub struct Batch {
    snapshots: Vec<Snapshot>,
}

impl Batch {
    pub(crate) fn new(snapshots: Vec<Snapshot>) -> Self {
        Self { snapshots }
    }

    /// Number of snapshots in the batch.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether the batch holds no snapshots. Committed batches never are.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// The snapshots, in capture order.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Whether the batch holds a snapshot of `target`.
    pub fn contains(&self, target: &Tracked) -> bool {
        self.snapshots.iter().any(|s| s.is_for(target))
    }

    /// Swaps live state with stored state for every object in the batch.
    ///
    /// Each slot is replaced with a capture of the object's current state,
    /// then the object is restored from the old slot and stamped with
    /// `stamp`. Fixups run for all objects before any notification fires.
    /// Afterwards the batch holds the inverse step.
    pub(crate) fn invert(&mut self, codec: &mut SnapshotCodec, stamp: Transaction) -> Result<()> {
        for (index, slot) in self.snapshots.iter_mut().enumerate() {
            let inverse = codec
                .capture(slot.target())
                .with_context(|| format!("Failed to capture inverse of slot {index}"))?;
            let stored = std::mem::replace(slot, inverse);
            SnapshotCodec::restore(&stored)
                .with_context(|| format!("Failed to restore slot {index}"))?;
            stored.target().borrow_mut().set_stamp(stamp);
        }

        for snapshot in &self.snapshots {
            snapshot.target().borrow_mut().after_restore();
        }
        for snapshot in &self.snapshots {
            snapshot.target().borrow_mut().on_changed();
        }
        Ok(())
    }
}
