//! Main Store struct tying all components together.

use crate::error::{Result, StoreError};
use crate::state::{HistoryStacks, Reducers};
use crate::subscriptions::{
    Selection, StoreEvent, SubscriptionConfig, SubscriptionFilter, SubscriptionHandle,
    SubscriptionId, SubscriptionManager,
};
use crate::types::{
    Action, ActionOrigin, History, OriginFilter, Sequence, StoreStats, TrackedAction,
};
use crossbeam_channel::bounded;
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Keep undo/redo history. Without it `undo`/`redo` always return false.
    pub time_travel: bool,

    /// Buffer size for selections and action observers.
    pub subscription_buffer: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            time_travel: true,
            subscription_buffer: 1000,
        }
    }
}

/// Mutable part of the store, replaced wholesale on each transition.
struct StoreState<S, A> {
    current: Arc<S>,
    history: HistoryStacks<S, A>,
    sequence: Sequence,
}

impl<S, A> StoreState<S, A> {
    fn state_changed(&self) -> StoreEvent<S, A> {
        StoreEvent::StateChanged {
            state: Arc::clone(&self.current),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            sequence: self.sequence,
        }
    }
}

/// Clears the notifying flag even if a subscriber panics.
struct NotifyGuard<'a>(&'a AtomicBool);

impl Drop for NotifyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The action-driven state store.
///
/// Holds one immutable state snapshot and replaces it on every transition:
/// - `dispatch` runs the registered reducers and records history
/// - `undo`/`redo` walk the history without running reducers
/// - `reset` returns to the initial state
///
/// Transitions are serialized per store and subscribers are notified
/// synchronously, in registration order, after the transition commits.
pub struct Store<S, A> {
    /// Store configuration.
    config: StoreConfig,

    /// State the store was built with, restored on reset.
    initial: Arc<S>,

    /// Reducer registry.
    reducers: Reducers<S, A>,

    /// Current snapshot, history, and sequence.
    state: RwLock<StoreState<S, A>>,

    /// Subscription registry.
    subscriptions: SubscriptionManager<S, A>,

    /// Serializes transitions together with their notifications.
    write_lock: ReentrantMutex<()>,

    /// Set while subscribers are being notified.
    notifying: AtomicBool,
}

impl<S, A> Store<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Create a store with the default configuration.
    pub fn new(initial: S, reducers: Reducers<S, A>) -> Self {
        Self::with_config(initial, reducers, StoreConfig::default())
    }

    /// Create a store.
    pub fn with_config(initial: S, reducers: Reducers<S, A>, config: StoreConfig) -> Self {
        let initial = Arc::new(initial);
        Self {
            config,
            reducers,
            state: RwLock::new(StoreState {
                current: Arc::clone(&initial),
                history: HistoryStacks::new(),
                sequence: Sequence::default(),
            }),
            initial,
            subscriptions: SubscriptionManager::new(),
            write_lock: ReentrantMutex::new(()),
            notifying: AtomicBool::new(false),
        }
    }

    // --- Transitions ---

    /// Enter the transition queue.
    ///
    /// Other threads block here; the thread that is currently notifying
    /// subscribers gets `ReentrantTransition` instead of interleaving a new
    /// transition between two notifications of the previous one.
    fn begin(&self) -> Result<ReentrantMutexGuard<'_, ()>> {
        let guard = self.write_lock.lock();
        if self.notifying.load(Ordering::SeqCst) {
            return Err(StoreError::ReentrantTransition);
        }
        Ok(guard)
    }

    /// Notify subscribers of a committed transition.
    fn publish(&self, events: &[StoreEvent<S, A>]) {
        self.notifying.store(true, Ordering::SeqCst);
        let _reset = NotifyGuard(&self.notifying);
        for event in events {
            self.subscriptions.broadcast(event);
        }
    }

    /// Dispatch an action through the reducers.
    ///
    /// Every reducer registered for the action runs in registration order.
    /// An action without reducers leaves the state as is but is still
    /// recorded in the history and on the action stream. If a reducer
    /// fails, nothing is committed and the error is returned.
    pub fn dispatch(&self, action: A) -> Result<()> {
        let action = Arc::new(action);
        let _lock = self.begin()?;

        let before = Arc::clone(&self.state.read().current);
        let next = self.reducers.apply(&before, &action)?;

        let events = {
            let mut state = self.state.write();
            if let Some(next) = next {
                state.current = Arc::new(next);
            }
            if self.config.time_travel {
                state.history.record(before, Arc::clone(&action));
            }
            state.sequence = state.sequence.next();

            debug!(
                action = action.name(),
                sequence = state.sequence.0,
                undo_depth = state.history.undo_depth(),
                "dispatched"
            );

            [
                state.state_changed(),
                StoreEvent::Action {
                    action,
                    origin: ActionOrigin::Dispatched,
                    sequence: state.sequence,
                },
            ]
        };

        self.publish(&events);
        Ok(())
    }

    /// Revert the most recent transition.
    ///
    /// Returns `Ok(false)` when there is nothing to undo.
    pub fn undo(&self) -> Result<bool> {
        self.step(ActionOrigin::Undone)
    }

    /// Reinstate the most recently undone transition.
    ///
    /// Returns `Ok(false)` when there is nothing to redo.
    pub fn redo(&self) -> Result<bool> {
        self.step(ActionOrigin::Redone)
    }

    fn step(&self, origin: ActionOrigin) -> Result<bool> {
        let _lock = self.begin()?;

        let events = {
            let mut state = self.state.write();
            let current = Arc::clone(&state.current);
            let entry = match origin {
                ActionOrigin::Undone => state.history.undo(current),
                _ => state.history.redo(current),
            };
            let Some(entry) = entry else {
                return Ok(false);
            };

            state.current = entry.snapshot;
            state.sequence = state.sequence.next();

            debug!(
                action = entry.action.name(),
                ?origin,
                sequence = state.sequence.0,
                "replayed"
            );

            [
                state.state_changed(),
                StoreEvent::Action {
                    action: entry.action,
                    origin,
                    sequence: state.sequence,
                },
            ]
        };

        self.publish(&events);
        Ok(true)
    }

    /// Restore the initial state and clear both history stacks.
    pub fn reset(&self) -> Result<()> {
        let _lock = self.begin()?;

        let events = {
            let mut state = self.state.write();
            state.current = Arc::clone(&self.initial);
            state.history.clear();
            state.sequence = state.sequence.next();

            info!(sequence = state.sequence.0, "store reset");

            [
                state.state_changed(),
                StoreEvent::Reset {
                    state: Arc::clone(&self.initial),
                    sequence: state.sequence,
                },
            ]
        };

        self.publish(&events);
        Ok(())
    }

    /// Run `f` while holding this store's transition queue.
    ///
    /// Transitions `f` makes on this store go through as usual; transitions
    /// from other threads wait until `f` returns, so a sequence of
    /// undo/redo calls is atomic to them.
    pub fn exclusive<R>(&self, f: impl FnOnce(&Self) -> R) -> Result<R> {
        let _lock = self.begin()?;
        Ok(f(self))
    }

    // --- Queries ---

    /// Current state snapshot.
    pub fn state(&self) -> Arc<S> {
        Arc::clone(&self.state.read().current)
    }

    /// State the store was created with.
    pub fn initial_state(&self) -> Arc<S> {
        Arc::clone(&self.initial)
    }

    pub fn can_undo(&self) -> bool {
        self.state.read().history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.state.read().history.can_redo()
    }

    pub fn time_travel_enabled(&self) -> bool {
        self.config.time_travel
    }

    /// Actions currently held in the undo and redo stacks.
    pub fn history(&self) -> History<A> {
        self.state.read().history.actions()
    }

    /// Sequence of the last committed transition.
    pub fn sequence(&self) -> Sequence {
        self.state.read().sequence
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.subscription_count()
    }

    pub fn stats(&self) -> StoreStats {
        let state = self.state.read();
        StoreStats {
            sequence: state.sequence,
            undo_depth: state.history.undo_depth(),
            redo_depth: state.history.redo_depth(),
            subscriptions: self.subscriptions.subscription_count(),
            reducers: self.reducers.len(),
        }
    }

    // --- Subscriptions ---

    /// Subscribe to raw store events through a bounded channel.
    pub fn subscribe(&self, config: SubscriptionConfig) -> SubscriptionHandle<S, A> {
        self.subscriptions.subscribe(config)
    }

    /// Register a synchronous callback, invoked after each matching commit.
    pub fn listen<F>(&self, filter: SubscriptionFilter, callback: F) -> SubscriptionId
    where
        F: Fn(&StoreEvent<S, A>) + Send + Sync + 'static,
    {
        self.subscriptions.listen(
            filter,
            Arc::new(move |event: &StoreEvent<S, A>| {
                callback(event);
                true
            }),
        )
    }

    /// Register a callback that stays subscribed while it returns `true`.
    pub(crate) fn listen_while<F>(&self, filter: SubscriptionFilter, callback: F) -> SubscriptionId
    where
        F: Fn(&StoreEvent<S, A>) -> bool + Send + Sync + 'static,
    {
        self.subscriptions.listen(filter, Arc::new(callback))
    }

    /// Hand every dispatched action to an analytics collaborator.
    pub fn track_actions<F>(&self, tracker: F) -> SubscriptionId
    where
        F: Fn(TrackedAction) + Send + Sync + 'static,
    {
        self.listen(
            SubscriptionFilter::actions(OriginFilter::Dispatched),
            move |event| {
                if let StoreEvent::Action { action, .. } = event {
                    tracker(TrackedAction::from_action(action.as_ref()));
                }
            },
        )
    }

    /// Project the state. Emits the current projection immediately, then
    /// again whenever a commit changes it.
    pub fn select<T, F>(&self, projector: F) -> Selection<T>
    where
        T: PartialEq + Clone + Send + 'static,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        let projector = Arc::new(projector);
        let initial = Arc::clone(&projector);
        self.distinct_selection(
            move |state| initial(state.current.as_ref()),
            move |event| match event {
                StoreEvent::StateChanged { state, .. } => Some(projector(state.as_ref())),
                _ => None,
            },
        )
    }

    /// Observe actions with the given origin.
    pub fn observe_action(&self, filter: OriginFilter) -> Selection<Arc<A>> {
        self.selection(SubscriptionFilter::actions(filter), |_| None, |event| {
            match event {
                StoreEvent::Action { action, .. } => Some(Arc::clone(action)),
                _ => None,
            }
        })
    }

    /// Observe whether there is anything to undo.
    pub fn observe_can_undo(&self) -> Selection<bool> {
        self.distinct_selection(
            |state| state.history.can_undo(),
            |event| match event {
                StoreEvent::StateChanged { can_undo, .. } => Some(*can_undo),
                _ => None,
            },
        )
    }

    /// Observe whether there is anything to redo.
    pub fn observe_can_redo(&self) -> Selection<bool> {
        self.distinct_selection(
            |state| state.history.can_redo(),
            |event| match event {
                StoreEvent::StateChanged { can_redo, .. } => Some(*can_redo),
                _ => None,
            },
        )
    }

    /// Observe reset markers.
    pub fn observe_reset(&self) -> Selection<()> {
        self.selection(SubscriptionFilter::reset(), |_| None, |event| match event {
            StoreEvent::Reset { .. } => Some(()),
            _ => None,
        })
    }

    /// Build a selection over store events.
    ///
    /// Registration happens inside the transition queue and `initial` sees
    /// the state under that queue, so the initial value and the first live
    /// value can't miss or duplicate a commit.
    fn selection<T, I, M>(&self, filter: SubscriptionFilter, initial: I, map: M) -> Selection<T>
    where
        T: Send + 'static,
        I: FnOnce(&StoreState<S, A>) -> Option<T>,
        M: Fn(&StoreEvent<S, A>) -> Option<T> + Send + Sync + 'static,
    {
        let _lock = self.write_lock.lock();
        let (sender, receiver) = bounded(self.config.subscription_buffer);

        let first = initial(&*self.state.read());
        if let Some(value) = first {
            // Fresh channel with capacity; only fails for a zero-sized buffer.
            let _ = sender.try_send(value);
        }

        let id = self.subscriptions.listen(
            filter,
            Arc::new(move |event: &StoreEvent<S, A>| match map(event) {
                Some(value) => sender.try_send(value).is_ok(),
                None => true,
            }),
        );

        Selection { id, receiver }
    }

    /// Build a distinct-until-changed selection over state changes.
    fn distinct_selection<T, I, M>(&self, initial: I, map: M) -> Selection<T>
    where
        T: PartialEq + Clone + Send + 'static,
        I: FnOnce(&StoreState<S, A>) -> T,
        M: Fn(&StoreEvent<S, A>) -> Option<T> + Send + Sync + 'static,
    {
        let last = Arc::new(Mutex::new(None::<T>));
        let seen = Arc::clone(&last);

        self.selection(
            SubscriptionFilter::state_changes(),
            move |state| {
                let first = initial(state);
                *seen.lock() = Some(first.clone());
                Some(first)
            },
            move |event| {
                let value = map(event)?;
                let mut last = last.lock();
                if last.as_ref() == Some(&value) {
                    return None;
                }
                *last = Some(value.clone());
                Some(value)
            },
        )
    }
}

impl<S, A> Store<S, A> {
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscriptions.unsubscribe(id)
    }
}
