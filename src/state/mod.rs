//! State transitions and history.
//!
//! Reducers turn the current snapshot into the next one; the history keeps
//! every prior snapshot behind an `Arc` so later transitions never
//! invalidate what the undo and redo stacks still reference.

mod history;
mod reducers;

pub use history::{Entry, HistoryStacks};
pub use reducers::{On, Reducers};
