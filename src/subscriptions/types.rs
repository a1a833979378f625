//! Subscription types for live store updates.

use crate::types::{ActionOrigin, OriginFilter, Sequence};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for a channel subscription.
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// Max buffered events before dropping subscriber.
    /// Default: 1000
    pub buffer_size: usize,

    /// Filter criteria.
    pub filter: SubscriptionFilter,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1000,
            filter: SubscriptionFilter::all(),
        }
    }
}

/// Filter criteria for subscriptions.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubscriptionFilter {
    /// Action events with a matching origin (None = no action events).
    pub actions: Option<OriginFilter>,

    /// Include state change events.
    pub include_state_changes: bool,

    /// Include reset markers.
    pub include_reset: bool,
}

impl SubscriptionFilter {
    /// Subscribe to actions with the given origin.
    pub fn actions(origin: OriginFilter) -> Self {
        Self {
            actions: Some(origin),
            ..Default::default()
        }
    }

    /// Subscribe to committed state changes.
    pub fn state_changes() -> Self {
        Self {
            include_state_changes: true,
            ..Default::default()
        }
    }

    /// Subscribe to reset markers.
    pub fn reset() -> Self {
        Self {
            include_reset: true,
            ..Default::default()
        }
    }

    /// Subscribe to everything.
    pub fn all() -> Self {
        Self {
            actions: Some(OriginFilter::All),
            include_state_changes: true,
            include_reset: true,
        }
    }

    /// Check whether an event passes this filter.
    pub fn matches<S, A>(&self, event: &StoreEvent<S, A>) -> bool {
        match event {
            StoreEvent::StateChanged { .. } => self.include_state_changes,
            StoreEvent::Action { origin, .. } => {
                self.actions.map_or(false, |filter| filter.accepts(*origin))
            }
            StoreEvent::Reset { .. } => self.include_reset,
            StoreEvent::Dropped { .. } => true,
        }
    }
}

/// Events emitted to subscribers.
///
/// A committed transition publishes `StateChanged` first and then its
/// `Action` or `Reset` event, both carrying the same sequence.
pub enum StoreEvent<S, A> {
    /// A transition committed a state.
    StateChanged {
        state: Arc<S>,
        can_undo: bool,
        can_redo: bool,
        sequence: Sequence,
    },

    /// An action went through the store.
    Action {
        action: Arc<A>,
        origin: ActionOrigin,
        sequence: Sequence,
    },

    /// The store returned to its initial state and cleared its history.
    Reset { state: Arc<S>, sequence: Sequence },

    /// Subscription was dropped.
    Dropped { reason: DropReason },
}

impl<S, A> StoreEvent<S, A> {
    /// Sequence of the transition that produced this event.
    pub fn sequence(&self) -> Option<Sequence> {
        match self {
            StoreEvent::StateChanged { sequence, .. }
            | StoreEvent::Action { sequence, .. }
            | StoreEvent::Reset { sequence, .. } => Some(*sequence),
            StoreEvent::Dropped { .. } => None,
        }
    }
}

impl<S, A> Clone for StoreEvent<S, A> {
    fn clone(&self) -> Self {
        match self {
            StoreEvent::StateChanged {
                state,
                can_undo,
                can_redo,
                sequence,
            } => StoreEvent::StateChanged {
                state: Arc::clone(state),
                can_undo: *can_undo,
                can_redo: *can_redo,
                sequence: *sequence,
            },
            StoreEvent::Action {
                action,
                origin,
                sequence,
            } => StoreEvent::Action {
                action: Arc::clone(action),
                origin: *origin,
                sequence: *sequence,
            },
            StoreEvent::Reset { state, sequence } => StoreEvent::Reset {
                state: Arc::clone(state),
                sequence: *sequence,
            },
            StoreEvent::Dropped { reason } => StoreEvent::Dropped {
                reason: reason.clone(),
            },
        }
    }
}

impl<S: fmt::Debug, A: fmt::Debug> fmt::Debug for StoreEvent<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreEvent::StateChanged {
                state,
                can_undo,
                can_redo,
                sequence,
            } => f
                .debug_struct("StateChanged")
                .field("state", state)
                .field("can_undo", can_undo)
                .field("can_redo", can_redo)
                .field("sequence", sequence)
                .finish(),
            StoreEvent::Action {
                action,
                origin,
                sequence,
            } => f
                .debug_struct("Action")
                .field("action", action)
                .field("origin", origin)
                .field("sequence", sequence)
                .finish(),
            StoreEvent::Reset { state, sequence } => f
                .debug_struct("Reset")
                .field("state", state)
                .field("sequence", sequence)
                .finish(),
            StoreEvent::Dropped { reason } => {
                f.debug_struct("Dropped").field("reason", reason).finish()
            }
        }
    }
}

/// Why a subscription was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Receiver went away.
    Disconnected,
    /// Explicitly unsubscribed.
    Unsubscribed,
}

/// Unique identifier for a subscription. Ids grow with registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

/// Handle to a channel subscription.
pub struct SubscriptionHandle<S, A> {
    pub id: SubscriptionId,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<StoreEvent<S, A>>,
}

impl<S, A> SubscriptionHandle<S, A> {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<StoreEvent<S, A>, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<StoreEvent<S, A>, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<StoreEvent<S, A>, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything buffered so far.
    pub fn drain(&self) -> Vec<StoreEvent<S, A>> {
        self.receiver.try_iter().collect()
    }
}

/// Stream of values projected out of store events.
///
/// Used for `select`, `observe_action`, `observe_can_undo` and friends.
pub struct Selection<T> {
    pub id: SubscriptionId,
    pub receiver: crossbeam_channel::Receiver<T>,
}

impl<T> Selection<T> {
    /// Receive the next value (blocking).
    pub fn recv(&self) -> Result<T, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a value (non-blocking).
    pub fn try_recv(&self) -> Result<T, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<T, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything buffered so far.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// Most recent buffered value, discarding older ones.
    pub fn latest(&self) -> Option<T> {
        self.receiver.try_iter().last()
    }
}
