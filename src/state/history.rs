//! Undo/redo stacks of state snapshots.

use crate::types::History;
use std::sync::Arc;

/// A snapshot paired with the action whose transition it borders.
///
/// On the undo stack the snapshot is the state *before* the action; on the
/// redo stack it is the state *after* it.
pub struct Entry<S, A> {
    pub snapshot: Arc<S>,
    pub action: Arc<A>,
}

impl<S, A> Clone for Entry<S, A> {
    fn clone(&self) -> Self {
        Self {
            snapshot: Arc::clone(&self.snapshot),
            action: Arc::clone(&self.action),
        }
    }
}

/// Undo and redo stacks, most recent last.
///
/// Popping from one stack always pushes the complement onto the other.
pub struct HistoryStacks<S, A> {
    undo: Vec<Entry<S, A>>,
    redo: Vec<Entry<S, A>>,
}

impl<S, A> HistoryStacks<S, A> {
    pub fn new() -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }

    /// Record a new transition. Breaks any redo branch.
    pub fn record(&mut self, before: Arc<S>, action: Arc<A>) {
        self.undo.push(Entry {
            snapshot: before,
            action,
        });
        self.redo.clear();
    }

    /// Step back from `current`. Returns the restored entry.
    pub fn undo(&mut self, current: Arc<S>) -> Option<Entry<S, A>> {
        let entry = self.undo.pop()?;
        self.redo.push(Entry {
            snapshot: current,
            action: Arc::clone(&entry.action),
        });
        Some(entry)
    }

    /// Step forward from `current`. Returns the reinstated entry.
    pub fn redo(&mut self, current: Arc<S>) -> Option<Entry<S, A>> {
        let entry = self.redo.pop()?;
        self.undo.push(Entry {
            snapshot: current,
            action: Arc::clone(&entry.action),
        });
        Some(entry)
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Actions on both stacks, past oldest first and future next-redo first.
    pub fn actions(&self) -> History<A> {
        History {
            past: self.undo.iter().map(|e| Arc::clone(&e.action)).collect(),
            future: self.redo.iter().rev().map(|e| Arc::clone(&e.action)).collect(),
        }
    }
}

impl<S, A> Default for HistoryStacks<S, A> {
    fn default() -> Self {
        Self::new()
    }
}
