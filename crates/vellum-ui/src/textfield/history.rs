//! Bounded undo/redo over full buffer snapshots.

use super::buffer::Snapshot;

pub const DEFAULT_CAPACITY: usize = 500;

/// How an edit coalesces with the one before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditKind {
    /// Runs of inserted text merge into one undo step.
    Typing,
    /// Runs of backspace/delete merge into one undo step.
    Deleting,
    /// Always its own step.
    Other,
}

#[derive(Clone, Debug)]
pub struct History {
    entries: Vec<Snapshot>,
    index: usize,
    capacity: usize,
    burst: Option<EditKind>,
}

impl History {
    /// `initial` becomes entry 0; undo never goes past it.
    pub fn new(initial: Snapshot, capacity: usize) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
            capacity: capacity.max(2),
            burst: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn current(&self) -> &Snapshot {
        &self.entries[self.index]
    }

    /// Forgets everything and starts over from `initial`.
    pub fn reset(&mut self, initial: Snapshot) {
        self.entries.clear();
        self.entries.push(initial);
        self.index = 0;
        self.burst = None;
    }

    /// Ends the current typing or deleting run.
    pub fn close_burst(&mut self) {
        self.burst = None;
    }

    /// Records an edit that turned `before` into `after`.
    pub fn record(&mut self, before: Snapshot, after: Snapshot, kind: EditKind) {
        if kind != EditKind::Other && self.burst == Some(kind) {
            self.entries.truncate(self.index + 1);
            self.entries[self.index] = after;
            return;
        }
        self.entries.truncate(self.index + 1);
        // The cursor may have moved since the last entry; undo must land on
        // the exact pre-edit state.
        if self.entries[self.index] != before {
            self.entries.push(before);
        }
        self.entries.push(after);
        self.index = self.entries.len() - 1;
        self.burst = (kind != EditKind::Other).then_some(kind);

        let overflow = self.entries.len().saturating_sub(self.capacity);
        if overflow > 0 {
            self.entries.drain(..overflow);
            self.index -= overflow;
        }
        log::trace!("history: {} entries, at {}", self.entries.len(), self.index);
    }

    pub fn undo(&mut self) -> Option<&Snapshot> {
        self.burst = None;
        if !self.can_undo() {
            log::debug!("nothing to undo");
            return None;
        }
        self.index -= 1;
        Some(&self.entries[self.index])
    }

    pub fn redo(&mut self) -> Option<&Snapshot> {
        self.burst = None;
        if !self.can_redo() {
            log::debug!("nothing to redo");
            return None;
        }
        self.index += 1;
        Some(&self.entries[self.index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::textfield::buffer::{TextBuffer, TextPosition};

    fn edit(b: &mut TextBuffer, h: &mut History, kind: EditKind, f: impl FnOnce(&mut TextBuffer)) {
        let before = b.snapshot();
        f(b);
        h.record(before, b.snapshot(), kind);
    }

    #[test]
    fn test_typing_burst_is_one_step() {
        let mut b = TextBuffer::new(true);
        let mut h = History::new(b.snapshot(), DEFAULT_CAPACITY);
        for ch in ["a", "b", "c"] {
            edit(&mut b, &mut h, EditKind::Typing, |b| b.insert(ch));
        }
        assert_eq!(h.len(), 2);
        let snap = h.undo().cloned().unwrap();
        b.restore(&snap);
        assert_eq!(b.text(), "");
        assert!(h.undo().is_none());
    }

    #[test]
    fn test_undo_restores_exact_pre_edit_state() {
        let mut b = TextBuffer::with_text("hello world", true);
        let mut h = History::new(b.snapshot(), DEFAULT_CAPACITY);
        b.select(TextPosition::new(0, 0), TextPosition::new(0, 5));
        let before = b.snapshot();
        edit(&mut b, &mut h, EditKind::Typing, |b| b.insert("bye"));
        assert_eq!(b.text(), "bye world");

        let snap = h.undo().cloned().unwrap();
        b.restore(&snap);
        assert_eq!(b.snapshot(), before);

        let snap = h.redo().cloned().unwrap();
        b.restore(&snap);
        assert_eq!(b.text(), "bye world");
        assert_eq!(b.cursor(), TextPosition::new(0, 3));
    }

    #[test]
    fn test_kind_change_and_motion_split_bursts() {
        let mut b = TextBuffer::new(true);
        let mut h = History::new(b.snapshot(), DEFAULT_CAPACITY);
        edit(&mut b, &mut h, EditKind::Typing, |b| b.insert("ab"));
        edit(&mut b, &mut h, EditKind::Deleting, |b| {
            b.backspace();
        });
        h.close_burst();
        edit(&mut b, &mut h, EditKind::Deleting, |b| {
            b.backspace();
        });
        assert_eq!(h.len(), 4);
        assert_eq!(h.undo().map(|s| s.lines[0].clone()).as_deref(), Some("a"));
        assert_eq!(h.undo().map(|s| s.lines[0].clone()).as_deref(), Some("ab"));
    }

    #[test]
    fn test_new_edit_truncates_redo() {
        let mut b = TextBuffer::new(true);
        let mut h = History::new(b.snapshot(), DEFAULT_CAPACITY);
        edit(&mut b, &mut h, EditKind::Other, |b| b.insert("x"));
        edit(&mut b, &mut h, EditKind::Other, |b| b.insert("y"));
        let snap = h.undo().cloned().unwrap();
        b.restore(&snap);
        edit(&mut b, &mut h, EditKind::Other, |b| b.insert("z"));
        assert!(!h.can_redo());
        assert_eq!(h.current().lines, vec!["xz".to_string()]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut b = TextBuffer::new(true);
        let mut h = History::new(b.snapshot(), 3);
        for ch in ["1", "2", "3", "4"] {
            edit(&mut b, &mut h, EditKind::Other, |b| b.insert(ch));
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.index(), 2);
        while h.undo().is_some() {}
        assert_eq!(h.current().lines, vec!["12".to_string()]);
    }
}
