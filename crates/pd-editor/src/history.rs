//! Undo/redo history.
//!
//! The log stores whole-document snapshots (node sequence + config) with a
//! cursor pointing at the entry that matches the live state. Committing a
//! snapshot equal to the cursor entry is a no-op, so callers may commit
//! liberally after every mutation.
//!
//! Gestures (drag, nudge) are grouped by **batching**: while batching, commits
//! are suppressed; ending the batch commits once.

use pd_core::model::{Node, ProjectConfig};

/// Maximum number of retained snapshots.
pub const HISTORY_CAPACITY: usize = 50;

/// One immutable (nodes, config) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub nodes: Vec<Node>,
    pub config: ProjectConfig,
}

impl Snapshot {
    pub fn new(nodes: Vec<Node>, config: ProjectConfig) -> Self {
        Self { nodes, config }
    }
}

/// Bounded snapshot log with a cursor.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: Vec<Snapshot>,
    /// Position of the entry matching the live state; meaningless when empty.
    cursor: usize,
    capacity: usize,
    batching: bool,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity.min(HISTORY_CAPACITY)),
            cursor: 0,
            capacity: capacity.max(1),
            batching: false,
        }
    }

    /// Record `snapshot` as the new current state.
    ///
    /// Returns `false` when suppressed (batching, or identical to the cursor
    /// entry). Anything after the cursor is discarded; the oldest entry is
    /// evicted once over capacity.
    pub fn commit(&mut self, snapshot: Snapshot) -> bool {
        if self.batching {
            log::trace!("history commit suppressed: batching");
            return false;
        }
        if self.current() == Some(&snapshot) {
            log::trace!("history commit suppressed: unchanged");
            return false;
        }

        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(snapshot);
        self.cursor = self.entries.len() - 1;

        if self.entries.len() > self.capacity {
            self.entries.remove(0);
            self.cursor -= 1;
        }
        log::debug!("history commit: {} entries, cursor {}", self.entries.len(), self.cursor);
        true
    }

    /// Step back; returns a copy of the state to restore.
    pub fn undo(&mut self) -> Option<Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).cloned()
    }

    /// Step forward; returns a copy of the state to restore.
    pub fn redo(&mut self) -> Option<Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor).cloned()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// The entry the live state corresponds to.
    pub fn current(&self) -> Option<&Snapshot> {
        self.entries.get(self.cursor)
    }

    /// Cursor position, `None` while the log is empty.
    pub fn cursor(&self) -> Option<usize> {
        (!self.entries.is_empty()).then_some(self.cursor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_batching(&self) -> bool {
        self.batching
    }

    /// Toggle commit suppression. The caller commits after turning it off.
    pub fn set_batching(&mut self, batching: bool) {
        self.batching = batching;
    }

    /// Drop every entry and leave batching mode.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.cursor = 0;
        self.batching = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snap(width: f64) -> Snapshot {
        Snapshot::new(
            Vec::new(),
            ProjectConfig {
                width,
                ..ProjectConfig::default()
            },
        )
    }

    #[test]
    fn empty_log_has_nothing_to_do() {
        let mut log = HistoryLog::new();
        assert_eq!(log.cursor(), None);
        assert!(!log.can_undo());
        assert!(!log.can_redo());
        assert_eq!(log.undo(), None);
        assert_eq!(log.redo(), None);
    }

    #[test]
    fn undo_and_redo_walk_the_cursor() {
        let mut log = HistoryLog::new();
        log.commit(snap(1.0));
        log.commit(snap(2.0));
        log.commit(snap(3.0));

        assert_eq!(log.undo(), Some(snap(2.0)));
        assert_eq!(log.undo(), Some(snap(1.0)));
        assert_eq!(log.undo(), None);
        assert_eq!(log.cursor(), Some(0));
        assert_eq!(log.redo(), Some(snap(2.0)));
        assert_eq!(log.redo(), Some(snap(3.0)));
        assert_eq!(log.redo(), None);
    }

    #[test]
    fn identical_snapshot_is_ignored() {
        let mut log = HistoryLog::new();
        assert!(log.commit(snap(1.0)));
        assert!(!log.commit(snap(1.0)));
        assert_eq!(log.len(), 1);
        assert_eq!(log.cursor(), Some(0));
    }

    #[test]
    fn commit_after_undo_discards_redo_branch() {
        let mut log = HistoryLog::new();
        log.commit(snap(1.0));
        log.commit(snap(2.0));
        log.commit(snap(3.0));
        log.undo();
        log.undo();
        log.commit(snap(9.0));
        assert_eq!(log.len(), 2);
        assert!(!log.can_redo());
        assert_eq!(log.current(), Some(&snap(9.0)));
    }

    #[test]
    fn capacity_slides_the_window() {
        let mut log = HistoryLog::new();
        for i in 0..(HISTORY_CAPACITY + 7) {
            log.commit(snap(i as f64));
        }
        assert_eq!(log.len(), HISTORY_CAPACITY);
        assert_eq!(log.cursor(), Some(HISTORY_CAPACITY - 1));

        let mut steps = 0;
        while log.undo().is_some() {
            steps += 1;
        }
        assert_eq!(steps, HISTORY_CAPACITY - 1);
        // Oldest surviving entry is the 8th commit.
        assert_eq!(log.current(), Some(&snap(7.0)));
    }

    #[test]
    fn batching_suppresses_commits() {
        let mut log = HistoryLog::new();
        log.commit(snap(1.0));
        log.set_batching(true);
        assert!(!log.commit(snap(2.0)));
        assert!(!log.commit(snap(3.0)));
        log.set_batching(false);
        assert!(log.commit(snap(3.0)));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn reset_clears_everything() {
        let mut log = HistoryLog::with_capacity(3);
        log.set_batching(true);
        log.reset();
        assert!(!log.is_batching());
        assert!(log.is_empty());
        assert_eq!(log.capacity(), 3);
    }
}
