//! Time travel over a primary store.
//!
//! A `TimeTravel` coordinator is itself a store: its state is a `Timeline`
//! of the primary store's actions and its reducers react to the primary's
//! tagged action stream:
//! - `Dispatched` starts a new branch and discards the recorded future
//! - `Undone` moves the last past action to the front of the future
//! - `Redone` moves the next future action back onto the past
//!
//! Scrubbing and playback never touch the timeline directly; they call the
//! primary store's `undo`/`redo` and let the resulting traffic flow back.
//!
//! # Example
//!
//! ```ignore
//! let store = Arc::new(Store::new(0, reducers));
//! let time_travel = TimeTravel::attach(Arc::clone(&store), TimeTravelConfig::default())?;
//!
//! store.dispatch(CounterAction::Increment)?;
//! store.dispatch(CounterAction::Increment)?;
//!
//! time_travel.scrub_to(0)?;
//! time_travel.play()?;
//! let _timer = time_travel.spawn_player()?;
//! ```

mod coordinator;
mod playback;
mod timeline;

pub use coordinator::{Controls, TimeTravel, TimeTravelConfig};
pub use playback::PlaybackTimer;
pub use timeline::{timeline_reducers, Timeline, TimelineAction, TimelineSummary};
