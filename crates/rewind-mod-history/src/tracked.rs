/// The capability a host object implements to take part in undo/redo.
use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;

use crate::snapshot::{SnapshotReader, SnapshotWriter};

/// Value of the transaction clock. Each value names one coalesced burst of
/// edits. The clock starts at 0 and the first transaction is 1, so a fresh
/// object with a zero stamp is never mistaken for an already-recorded one.
pub type Transaction = u64;

/// A mutable host object whose state can be captured and restored.
///
/// `capture` and `restore` form a positional pair: `restore` must read
/// exactly the fields `capture` wrote, in the same order. Nothing in a
/// snapshot describes its own layout.
pub trait Undoable {
    /// Last transaction this object was recorded or restored in.
    fn stamp(&self) -> Transaction;

    /// Written only by the undo engine.
    fn set_stamp(&mut self, stamp: Transaction);

    /// Writes the object's state to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if a field cannot be encoded.
    fn capture(&self, writer: &mut SnapshotWriter) -> Result<()>;

    /// Reads back the state written by a matching `capture`.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot runs out of bytes or handles, or a
    /// handle has an unexpected type.
    fn restore(&mut self, reader: &mut SnapshotReader<'_>) -> Result<()>;

    /// Rebuilds derived state after an undo or redo.
    ///
    /// Runs once every object in the inverted batch has been restored and
    /// before any `on_changed` hook fires.
    fn after_restore(&mut self) {}

    /// Change notification, fired when a transaction commits and after an
    /// undo or redo.
    fn on_changed(&mut self) {}
}

/// Shared handle to a tracked object.
pub type Tracked = Rc<RefCell<dyn Undoable>>;

/// Identity comparison for tracked objects.
///
/// Compares data pointers only, so two handles to the same object compare
/// equal even if they were coerced through different vtables.
pub fn same_object(a: &Tracked, b: &Tracked) -> bool {
    std::ptr::eq(Rc::as_ptr(a).cast::<()>(), Rc::as_ptr(b).cast::<()>())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy {
        stamp: Transaction,
    }

    impl Undoable for Dummy {
        fn stamp(&self) -> Transaction {
            self.stamp
        }

        fn set_stamp(&mut self, stamp: Transaction) {
            self.stamp = stamp;
        }

        fn capture(&self, _writer: &mut SnapshotWriter) -> Result<()> {
            Ok(())
        }

        fn restore(&mut self, _reader: &mut SnapshotReader<'_>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_same_object_identity() {
        let a: Tracked = Rc::new(RefCell::new(Dummy { stamp: 0 }));
        let b: Tracked = Rc::new(RefCell::new(Dummy { stamp: 0 }));
        let a2 = Rc::clone(&a);
        assert!(same_object(&a, &a2));
        assert!(!same_object(&a, &b));
    }

    #[test]
    fn test_same_object_after_coercion() {
        let concrete = Rc::new(RefCell::new(Dummy { stamp: 0 }));
        let first: Tracked = concrete.clone();
        let second: Tracked = concrete;
        assert!(same_object(&first, &second));
    }
}
