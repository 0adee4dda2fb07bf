//! Linear undo/redo history over full snapshots
//!
//! The history is a bounded sequence of immutable snapshots with a cursor.
//! Pushing while the cursor is not at the tail discards the redo suffix;
//! exceeding capacity evicts the oldest entry.

use crate::annotation::Annotation;
use std::collections::VecDeque;

/// History of annotation-set snapshots
pub type AnnotationHistory = History<Vec<Annotation>>;

#[derive(Debug, Clone)]
pub struct History<T> {
    entries: VecDeque<T>,
    index: usize,
    capacity: usize,

    /// Set while a snapshot from this history is being applied
    restoring: bool,
}

impl<T: Clone> History<T> {
    /// Create a history holding a single initial entry
    pub fn new(initial: T, capacity: usize) -> Self {
        let mut entries = VecDeque::with_capacity(capacity.max(1));
        entries.push_back(initial);
        Self {
            entries,
            index: 0,
            capacity: capacity.max(1),
            restoring: false,
        }
    }

    /// Record a new snapshot at the cursor
    ///
    /// Returns `false` without recording while a restore is in progress.
    pub fn push(&mut self, snapshot: T) -> bool {
        if self.restoring {
            return false;
        }

        self.entries.truncate(self.index + 1);
        self.entries.push_back(snapshot);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.index = self.entries.len() - 1;
        true
    }

    /// Step back one entry and return it
    pub fn undo(&mut self) -> Option<T> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index).cloned()
    }

    /// Step forward one entry and return it
    pub fn redo(&mut self) -> Option<T> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index).cloned()
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// Snapshot at the cursor
    pub fn current(&self) -> Option<&T> {
        self.entries.get(self.index)
    }

    /// Drop everything and start again from a single entry
    pub fn reset(&mut self, initial: T) {
        self.entries.clear();
        self.entries.push_back(initial);
        self.index = 0;
        self.restoring = false;
    }

    /// Mark the start or end of applying an undo/redo snapshot
    pub fn set_restoring(&mut self, restoring: bool) {
        self.restoring = restoring;
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
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

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
