//! Timeline state and the reducers that keep it in step with a primary store.

use crate::state::Reducers;
use crate::types::{Action, Fields, History};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Past and future of a primary store, as seen by the coordinator.
///
/// `current_position` always equals `current_actions.len()`, and
/// `max_position` equals `current_position + future_actions.len()`.
pub struct Timeline<A> {
    current_actions: Vec<Arc<A>>,
    future_actions: Vec<Arc<A>>,
    current_position: usize,
    max_position: usize,
    playback_active: bool,
}

impl<A> Timeline<A> {
    pub fn new() -> Self {
        Self {
            current_actions: Vec::new(),
            future_actions: Vec::new(),
            current_position: 0,
            max_position: 0,
            playback_active: false,
        }
    }

    /// Timeline matching an existing undo/redo history.
    pub fn from_history(history: History<A>) -> Self {
        let current_position = history.past.len();
        let max_position = current_position + history.future.len();
        Self {
            current_actions: history.past,
            future_actions: history.future,
            current_position,
            max_position,
            playback_active: false,
        }
    }

    /// Actions behind the current position, oldest first.
    pub fn current_actions(&self) -> &[Arc<A>] {
        &self.current_actions
    }

    /// Undone actions, most recently undone first.
    pub fn future_actions(&self) -> &[Arc<A>] {
        &self.future_actions
    }

    pub fn current_position(&self) -> usize {
        self.current_position
    }

    pub fn max_position(&self) -> usize {
        self.max_position
    }

    pub fn playback_active(&self) -> bool {
        self.playback_active
    }

    /// The action a redo would reinstate.
    pub fn next_action(&self) -> Option<&Arc<A>> {
        self.future_actions.first()
    }

    /// The action an undo would revert.
    pub fn last_action(&self) -> Option<&Arc<A>> {
        self.current_actions.last()
    }

    /// Plain summary without the actions themselves.
    pub fn summary(&self) -> TimelineSummary {
        TimelineSummary {
            current_position: self.current_position,
            max_position: self.max_position,
            future_len: self.future_actions.len(),
            playback_active: self.playback_active,
        }
    }
}

impl<A> Default for Timeline<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for Timeline<A> {
    fn clone(&self) -> Self {
        Self {
            current_actions: self.current_actions.clone(),
            future_actions: self.future_actions.clone(),
            current_position: self.current_position,
            max_position: self.max_position,
            playback_active: self.playback_active,
        }
    }
}

impl<A: fmt::Debug> fmt::Debug for Timeline<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("current_actions", &self.current_actions)
            .field("future_actions", &self.future_actions)
            .field("current_position", &self.current_position)
            .field("max_position", &self.max_position)
            .field("playback_active", &self.playback_active)
            .finish()
    }
}

/// Positions and playback flag of a timeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TimelineSummary {
    pub current_position: usize,
    pub max_position: usize,
    pub future_len: usize,
    pub playback_active: bool,
}

/// Actions driving the coordinator's own store.
pub enum TimelineAction<A> {
    /// The primary store dispatched a new action.
    Recorded(Arc<A>),
    /// The primary store undid an action.
    WentBack(Arc<A>),
    /// The primary store redid an action.
    WentForward(Arc<A>),
    /// Forget the whole timeline.
    Reset,
    TogglePlayback,
    SetPlayback(bool),
    /// A scrub was requested. Has no reducer: the primary store's
    /// undo/redo traffic moves the timeline.
    ScrubRequested { position: usize },
}

impl<A: fmt::Debug> fmt::Debug for TimelineAction<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimelineAction::Recorded(a) => f.debug_tuple("Recorded").field(a).finish(),
            TimelineAction::WentBack(a) => f.debug_tuple("WentBack").field(a).finish(),
            TimelineAction::WentForward(a) => f.debug_tuple("WentForward").field(a).finish(),
            TimelineAction::Reset => f.write_str("Reset"),
            TimelineAction::TogglePlayback => f.write_str("TogglePlayback"),
            TimelineAction::SetPlayback(active) => {
                f.debug_tuple("SetPlayback").field(active).finish()
            }
            TimelineAction::ScrubRequested { position } => f
                .debug_struct("ScrubRequested")
                .field("position", position)
                .finish(),
        }
    }
}

impl<A: Action> Action for TimelineAction<A> {
    fn name(&self) -> &'static str {
        match self {
            TimelineAction::Recorded(_) => "recorded",
            TimelineAction::WentBack(_) => "went_back",
            TimelineAction::WentForward(_) => "went_forward",
            TimelineAction::Reset => "reset",
            TimelineAction::TogglePlayback => "toggle_playback",
            TimelineAction::SetPlayback(_) => "set_playback",
            TimelineAction::ScrubRequested { .. } => "scrub_requested",
        }
    }

    fn describe(&self) -> Fields {
        let mut fields = Fields::new();
        match self {
            TimelineAction::Recorded(a)
            | TimelineAction::WentBack(a)
            | TimelineAction::WentForward(a) => {
                fields.insert("action", a.name().to_string());
            }
            TimelineAction::SetPlayback(active) => {
                fields.insert("active", active.to_string());
            }
            TimelineAction::ScrubRequested { position } => {
                fields.insert("position", position.to_string());
            }
            TimelineAction::Reset | TimelineAction::TogglePlayback => {}
        }
        fields
    }
}

/// Reducers of the coordinator's store.
pub fn timeline_reducers<A: Action>() -> Reducers<Timeline<A>, TimelineAction<A>> {
    Reducers::<Timeline<A>, TimelineAction<A>>::new()
        .on("recorded", |timeline: &Timeline<A>, action| match action {
            TimelineAction::Recorded(a) => record(timeline, a),
            _ => timeline.clone(),
        })
        .on("went_back", |timeline: &Timeline<A>, action| match action {
            TimelineAction::WentBack(a) => go_back(timeline, a),
            _ => timeline.clone(),
        })
        .on("went_forward", |timeline: &Timeline<A>, action| match action {
            TimelineAction::WentForward(a) => go_forward(timeline, a),
            _ => timeline.clone(),
        })
        .on("reset", |_: &Timeline<A>, _| Timeline::new())
        .on("toggle_playback", |timeline: &Timeline<A>, _| Timeline {
            playback_active: !timeline.playback_active,
            ..timeline.clone()
        })
        .on("set_playback", |timeline: &Timeline<A>, action| match action {
            TimelineAction::SetPlayback(active) => Timeline {
                playback_active: *active,
                ..timeline.clone()
            },
            _ => timeline.clone(),
        })
}

/// A new branch point: the recorded future is discarded.
fn record<A>(timeline: &Timeline<A>, action: &Arc<A>) -> Timeline<A> {
    let mut current_actions = timeline.current_actions.clone();
    current_actions.push(Arc::clone(action));
    let current_position = timeline.current_position + 1;

    Timeline {
        current_actions,
        future_actions: Vec::new(),
        current_position,
        max_position: current_position,
        playback_active: timeline.playback_active,
    }
}

fn go_back<A: Action>(timeline: &Timeline<A>, action: &Arc<A>) -> Timeline<A> {
    let mut current_actions = timeline.current_actions.clone();
    let Some(last) = current_actions.pop() else {
        warn!(action = action.name(), "undo observed with an empty timeline");
        return timeline.clone();
    };
    if !Arc::ptr_eq(&last, action) {
        warn!(action = action.name(), "undone action is not the last recorded one");
    }

    let mut future_actions = Vec::with_capacity(timeline.future_actions.len() + 1);
    future_actions.push(last);
    future_actions.extend(timeline.future_actions.iter().cloned());

    Timeline {
        current_actions,
        future_actions,
        current_position: timeline.current_position - 1,
        max_position: timeline.max_position,
        playback_active: timeline.playback_active,
    }
}

fn go_forward<A: Action>(timeline: &Timeline<A>, action: &Arc<A>) -> Timeline<A> {
    let mut current_actions = timeline.current_actions.clone();
    current_actions.push(Arc::clone(action));
    let current_position = timeline.current_position + 1;

    let future_actions = match timeline.future_actions.split_first() {
        Some((next, rest)) if Arc::ptr_eq(next, action) => rest.to_vec(),
        _ => {
            // History and timeline disagree; keep positions consistent.
            warn!(action = action.name(), "redone action is not the next recorded one");
            Vec::new()
        }
    };

    Timeline {
        max_position: current_position + future_actions.len(),
        current_actions,
        future_actions,
        current_position,
        playback_active: timeline.playback_active,
    }
}
