/// Snapshot-based undo/redo for a graph of mutable objects.
///
/// Hosts call `UndoSystem::record` right before mutating a tracked object.
/// Every record made during one synchronous burst shares a transaction; the
/// transaction is committed later by a task posted on the owning thread's
/// queue, producing a single undo step. Undo and redo swap the live state of
/// each object in a step with the snapshot stored for it.
pub mod batch;
pub mod config;
pub mod manager;
pub mod scheduler;
pub mod snapshot;
pub mod tracked;

pub use batch::Batch;
pub use config::HistoryConfig;
pub use manager::UndoSystem;
pub use scheduler::{LocalQueue, Scheduler, Task};
pub use snapshot::{Handle, Snapshot, SnapshotCodec, SnapshotReader, SnapshotWriter};
pub use tracked::{same_object, Tracked, Transaction, Undoable};
