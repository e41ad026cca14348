/// Configuration for the undo history.
use serde::{Deserialize, Serialize};

/// Default cap on committed undo steps. Zero means unbounded.
const DEFAULT_MAX_UNDO_DEPTH: usize = 0;

/// Configuration for an `UndoSystem`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Max batches kept on the undo stack; the oldest are dropped first.
    /// `0` keeps every batch.
    pub max_undo_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_undo_depth: DEFAULT_MAX_UNDO_DEPTH,
        }
    }
}

impl HistoryConfig {
    /// Creates a config that keeps at most `depth` undo batches.
    pub fn with_max_undo_depth(depth: usize) -> Self {
        Self {
            max_undo_depth: depth,
        }
    }

    /// Whether an undo depth cap is in effect.
    pub fn is_bounded(&self) -> bool {
        self.max_undo_depth > 0
    }

    /// Number of batches to drop from the bottom of an undo stack of `len`.
    pub(crate) fn excess(&self, len: usize) -> usize {
        if self.is_bounded() {
            len.saturating_sub(self.max_undo_depth)
        } else {
            0
        }
    }
}
