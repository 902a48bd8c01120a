//! Buffer snapshots.

use serde::{Deserialize, Serialize};

/// A point-in-time, fully-materialized copy of a buffer's state.
///
/// Transmitted by value over RPC; there is no live reference, so a snapshot
/// can go stale the moment the host edits the buffer. An empty `name` is the
/// protocol-level sentinel for "no such buffer" — transport errors are
/// reserved for genuine connection failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferInfo {
    /// Buffer name; empty means "not found".
    pub name: String,
    /// Full text content.
    pub content: String,
    /// Cursor offset in characters.
    pub position: usize,
    /// Whether the buffer has unsaved changes.
    pub is_dirty: bool,
    /// Backing file path, empty for scratch buffers.
    pub filename: String,
}

impl BufferInfo {
    /// The "not found" sentinel snapshot.
    #[must_use]
    pub fn missing() -> Self {
        Self::default()
    }

    /// Returns true if this snapshot is the "not found" sentinel.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sentinel_has_empty_name() {
        assert!(BufferInfo::missing().is_missing());
    }

    #[test]
    fn named_snapshot_is_not_missing() {
        let info = BufferInfo {
            name: "*scratch*".to_string(),
            ..BufferInfo::default()
        };
        assert!(!info.is_missing());
    }
}
