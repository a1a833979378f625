//! # Rewind
//!
//! An action-driven state store with undo/redo history and time travel.
//!
//! ## Core Concepts
//!
//! - **Store**: Holds one immutable state and applies reducers on dispatch
//! - **History**: Undo/redo stacks of prior snapshots
//! - **Action origin**: Every published action is tagged `Dispatched`,
//!   `Undone`, or `Redone`
//! - **Entities**: Normalized, order-preserving id-to-entity collections
//! - **Time travel**: A second store that turns the history into a
//!   scrubbable, playable timeline
//!
//! ## Example
//!
//! ```ignore
//! use rewind::{Action, Reducers, Store};
//!
//! #[derive(Debug)]
//! enum CounterAction { Increment, Add(i64) }
//!
//! impl Action for CounterAction {
//!     fn name(&self) -> &'static str {
//!         match self {
//!             CounterAction::Increment => "increment",
//!             CounterAction::Add(_) => "add",
//!         }
//!     }
//! }
//!
//! let store = Store::new(0i64, Reducers::<i64, CounterAction>::new()
//!     .on("increment", |s, _| s + 1)
//!     .on("add", |s, a| match a { CounterAction::Add(n) => s + n, _ => *s }));
//!
//! store.dispatch(CounterAction::Add(3))?;
//! store.undo()?;
//! assert_eq!(*store.state(), 0);
//! ```

pub mod entities;
pub mod error;
pub mod state;
pub mod store;
pub mod subscriptions;
pub mod time_travel;
pub mod types;

// Re-exports
pub use entities::{EntityAdapter, EntityState};
pub use error::{BoxError, Result, StoreError};
pub use state::{On, Reducers};
pub use store::{Store, StoreConfig};
pub use subscriptions::{
    DropReason, Selection, StoreEvent, SubscriptionConfig, SubscriptionFilter,
    SubscriptionHandle, SubscriptionId,
};
pub use time_travel::{
    Controls, PlaybackTimer, TimeTravel, TimeTravelConfig, Timeline, TimelineAction,
    TimelineSummary,
};
pub use types::*;
