// Re-exports from rewind-mod-history used by the document model.
pub use rewind_mod_history::{
    Handle, HistoryConfig, LocalQueue, SnapshotReader, SnapshotWriter, Tracked, Transaction,
    UndoSystem, Undoable,
};
