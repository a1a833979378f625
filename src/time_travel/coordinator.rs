//! Time-travel coordinator: a store whose state is another store's timeline.

use super::playback::PlaybackTimer;
use super::timeline::{timeline_reducers, Timeline, TimelineAction};
use crate::error::{Result, StoreError};
use crate::store::{Store, StoreConfig};
use crate::subscriptions::{
    Selection, StoreEvent, SubscriptionConfig, SubscriptionFilter, SubscriptionHandle,
    SubscriptionId,
};
use crate::types::{Action, ActionOrigin, OriginFilter, TrackedAction};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{error, info};

/// Coordinator configuration.
#[derive(Clone, Debug)]
pub struct TimeTravelConfig {
    /// Delay between two playback steps.
    /// Default: 1s
    pub playback_interval: Duration,

    /// Buffer size for the coordinator's own selections.
    pub subscription_buffer: usize,
}

impl Default for TimeTravelConfig {
    fn default() -> Self {
        Self {
            playback_interval: Duration::from_secs(1),
            subscription_buffer: 1000,
        }
    }
}

/// Which time-travel operations make sense right now.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub can_undo: bool,
    pub can_redo: bool,
    pub can_reset: bool,
    pub can_play_pause: bool,
    pub can_scrub: bool,
}

struct Coordinator<S, A> {
    primary: Arc<Store<S, A>>,
    timeline: Store<Timeline<A>, TimelineAction<A>>,
    config: TimeTravelConfig,
    /// Our listener on the primary store.
    primary_listener: Mutex<Option<SubscriptionId>>,
}

impl<S, A> Coordinator<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Mirror one primary store event onto the timeline.
    fn observe(&self, event: &StoreEvent<S, A>) {
        let action = match event {
            StoreEvent::Action { action, origin, .. } => match origin {
                ActionOrigin::Dispatched => TimelineAction::Recorded(Arc::clone(action)),
                ActionOrigin::Undone => TimelineAction::WentBack(Arc::clone(action)),
                ActionOrigin::Redone => TimelineAction::WentForward(Arc::clone(action)),
            },
            StoreEvent::Reset { .. } => TimelineAction::Reset,
            _ => return,
        };
        let redone = matches!(action, TimelineAction::WentForward(_));

        if let Err(e) = self.timeline.dispatch(action) {
            error!(error = %e, "failed to update timeline");
            return;
        }

        // Playing past the end of the recorded future stops playback.
        if redone && self.timeline.state().playback_active() && !self.primary.can_redo() {
            info!("playback reached the end of the timeline");
            if let Err(e) = self.timeline.dispatch(TimelineAction::SetPlayback(false)) {
                error!(error = %e, "failed to stop playback");
            }
        }
    }

    /// Drive the primary store to `position`. Caller holds the primary's
    /// transition queue.
    fn scrub_locked(&self, position: usize) -> Result<()> {
        let timeline = self.timeline.state();
        if position > timeline.max_position() {
            return Err(StoreError::PositionOutOfRange {
                requested: position,
                max: timeline.max_position(),
            });
        }

        self.timeline
            .dispatch(TimelineAction::ScrubRequested { position })?;

        let current = timeline.current_position();
        if position < current {
            for _ in 0..current - position {
                if !self.primary.undo()? {
                    break;
                }
            }
        } else {
            for _ in 0..position - current {
                if !self.primary.redo()? {
                    break;
                }
            }
        }
        Ok(())
    }

    /// One playback step. Returns whether the primary store moved forward.
    fn tick(&self) -> Result<bool> {
        self.primary.exclusive(|primary| -> Result<bool> {
            if !self.timeline.state().playback_active() {
                return Ok(false);
            }
            let advanced = primary.redo()?;
            if !advanced {
                info!("nothing left to replay, stopping playback");
                self.timeline.dispatch(TimelineAction::SetPlayback(false))?;
            }
            Ok(advanced)
        })?
    }
}

impl<S, A> Drop for Coordinator<S, A> {
    fn drop(&mut self) {
        if let Some(id) = self.primary_listener.get_mut().take() {
            self.primary.unsubscribe(id);
        }
    }
}

/// Time-travel coordinator for a primary store.
///
/// Keeps a `Timeline` of the primary store's actions by observing its
/// tagged action stream, and moves through that timeline by calling the
/// primary store's `undo`/`redo`. The timeline is never edited directly:
/// scrubbing and playback only drive the primary store and the observed
/// `Undone`/`Redone` traffic updates the timeline.
///
/// Handles are cheap to clone and share one coordinator.
pub struct TimeTravel<S, A> {
    inner: Arc<Coordinator<S, A>>,
}

impl<S, A> Clone for TimeTravel<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> TimeTravel<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Attach a coordinator to a primary store.
    ///
    /// The timeline starts out matching the primary store's current
    /// history. Fails with `TimeTravelDisabled` if the primary store keeps
    /// no history.
    pub fn attach(primary: Arc<Store<S, A>>, config: TimeTravelConfig) -> Result<Self> {
        if !primary.time_travel_enabled() {
            return Err(StoreError::TimeTravelDisabled);
        }

        let store = Arc::clone(&primary);
        store.exclusive(move |locked| {
            let history = locked.history();
            let timeline = Store::with_config(
                Timeline::from_history(history),
                timeline_reducers(),
                StoreConfig {
                    time_travel: false,
                    subscription_buffer: config.subscription_buffer,
                },
            );

            let inner = Arc::new(Coordinator {
                primary,
                timeline,
                config,
                primary_listener: Mutex::new(None),
            });

            let weak: Weak<Coordinator<S, A>> = Arc::downgrade(&inner);
            let id = locked.listen_while(
                SubscriptionFilter {
                    actions: Some(OriginFilter::All),
                    include_reset: true,
                    include_state_changes: false,
                },
                move |event| match weak.upgrade() {
                    Some(coordinator) => {
                        coordinator.observe(event);
                        true
                    }
                    None => false,
                },
            );
            *inner.primary_listener.lock() = Some(id);

            info!(
                position = inner.timeline.state().current_position(),
                max = inner.timeline.state().max_position(),
                "time travel attached"
            );

            Self { inner }
        })
    }

    /// The primary store this coordinator drives.
    pub fn primary(&self) -> &Arc<Store<S, A>> {
        &self.inner.primary
    }

    /// Current timeline.
    pub fn timeline(&self) -> Arc<Timeline<A>> {
        self.inner.timeline.state()
    }

    pub fn config(&self) -> &TimeTravelConfig {
        &self.inner.config
    }

    // --- Operations ---

    /// Move the primary store to `position` on the timeline.
    ///
    /// Runs as one unit: no other transition on the primary store can slip
    /// between the individual undo/redo steps.
    pub fn scrub_to(&self, position: usize) -> Result<()> {
        self.inner
            .primary
            .exclusive(|_| self.inner.scrub_locked(position))?
    }

    /// Start automatic replay.
    pub fn play(&self) -> Result<()> {
        info!("playback started");
        self.inner.timeline.dispatch(TimelineAction::SetPlayback(true))
    }

    /// Stop automatic replay. Takes effect before the next tick.
    pub fn pause(&self) -> Result<()> {
        info!("playback paused");
        self.inner.timeline.dispatch(TimelineAction::SetPlayback(false))
    }

    pub fn toggle(&self) -> Result<()> {
        self.inner.timeline.dispatch(TimelineAction::TogglePlayback)
    }

    /// Reset the primary store; the timeline follows its reset marker.
    pub fn reset(&self) -> Result<()> {
        self.inner.primary.reset()
    }

    /// One playback step: redo on the primary store while playback is on.
    ///
    /// A redo with nothing left to replay switches playback off.
    pub fn tick(&self) -> Result<bool> {
        self.inner.tick()
    }

    /// Tick on a background thread every `playback_interval`.
    pub fn spawn_player(&self) -> Result<PlaybackTimer> {
        let weak = Arc::downgrade(&self.inner);
        PlaybackTimer::spawn(self.inner.config.playback_interval, move || {
            match weak.upgrade() {
                Some(coordinator) => {
                    if let Err(e) = coordinator.tick() {
                        error!(error = %e, "playback tick failed");
                    }
                    true
                }
                None => false,
            }
        })
    }

    /// What a presentation layer should enable right now.
    pub fn controls(&self) -> Controls {
        let timeline = self.timeline();
        if timeline.playback_active() {
            return Controls {
                can_play_pause: true,
                ..Default::default()
            };
        }

        // One snapshot, so the flags can't straddle a commit.
        let can_undo = timeline.last_action().is_some();
        let can_redo = timeline.next_action().is_some();
        Controls {
            can_undo,
            can_redo,
            can_reset: can_undo || can_redo,
            can_play_pause: can_redo,
            can_scrub: timeline.max_position() > 0,
        }
    }

    // --- Projections ---

    /// Project the timeline.
    pub fn select<T, F>(&self, projector: F) -> Selection<T>
    where
        T: PartialEq + Clone + Send + 'static,
        F: Fn(&Timeline<A>) -> T + Send + Sync + 'static,
    {
        self.inner.timeline.select(projector)
    }

    /// Observe the coordinator's own actions.
    pub fn observe_action(&self, filter: OriginFilter) -> Selection<Arc<TimelineAction<A>>> {
        self.inner.timeline.observe_action(filter)
    }

    pub fn subscribe(
        &self,
        config: SubscriptionConfig,
    ) -> SubscriptionHandle<Timeline<A>, TimelineAction<A>> {
        self.inner.timeline.subscribe(config)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.timeline.unsubscribe(id)
    }

    /// Hand every coordinator action to an analytics collaborator.
    pub fn track_actions<F>(&self, tracker: F) -> SubscriptionId
    where
        F: Fn(TrackedAction) + Send + Sync + 'static,
    {
        self.inner.timeline.track_actions(tracker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Reducers;

    #[derive(Debug, Clone, PartialEq)]
    enum Edit {
        Push(char),
        Pop,
    }

    impl Action for Edit {
        fn name(&self) -> &'static str {
            match self {
                Edit::Push(_) => "push",
                Edit::Pop => "pop",
            }
        }
    }

    fn editor() -> Arc<Store<String, Edit>> {
        let reducers = Reducers::<String, Edit>::new()
            .on("push", |s: &String, a: &Edit| match a {
                Edit::Push(c) => format!("{}{}", s, c),
                _ => s.clone(),
            })
            .on("pop", |s: &String, _| {
                let mut next = s.clone();
                next.pop();
                next
            });
        Arc::new(Store::new(String::new(), reducers))
    }

    fn attached() -> (Arc<Store<String, Edit>>, TimeTravel<String, Edit>) {
        let store = editor();
        let tt = TimeTravel::attach(Arc::clone(&store), TimeTravelConfig::default()).unwrap();
        (store, tt)
    }

    #[test]
    fn test_records_dispatches() {
        let (store, tt) = attached();
        store.dispatch(Edit::Push('a')).unwrap();
        store.dispatch(Edit::Push('b')).unwrap();

        let timeline = tt.timeline();
        assert_eq!(timeline.current_position(), 2);
        assert_eq!(timeline.max_position(), 2);
    }

    #[test]
    fn test_scrub_back_and_forth() {
        let (store, tt) = attached();
        for c in "abcd".chars() {
            store.dispatch(Edit::Push(c)).unwrap();
        }

        tt.scrub_to(1).unwrap();
        assert_eq!(*store.state(), "a");
        assert_eq!(tt.timeline().current_position(), 1);
        assert_eq!(tt.timeline().future_actions().len(), 3);

        tt.scrub_to(3).unwrap();
        assert_eq!(*store.state(), "abc");
        assert_eq!(tt.timeline().max_position(), 4);
    }

    #[test]
    fn test_scrub_out_of_range() {
        let (store, tt) = attached();
        store.dispatch(Edit::Push('a')).unwrap();

        let err = tt.scrub_to(5).unwrap_err();
        assert!(matches!(
            err,
            StoreError::PositionOutOfRange {
                requested: 5,
                max: 1
            }
        ));
        assert_eq!(*store.state(), "a");
    }

    #[test]
    fn test_scrub_is_recorded_on_own_stream() {
        let (store, tt) = attached();
        store.dispatch(Edit::Push('a')).unwrap();
        let own = tt.observe_action(OriginFilter::Dispatched);

        tt.scrub_to(0).unwrap();

        let names: Vec<_> = own.drain().iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["scrub_requested", "went_back"]);
    }

    #[test]
    fn test_attach_refuses_disabled_history() {
        let store = Arc::new(Store::with_config(
            String::new(),
            Reducers::<String, Edit>::new(),
            StoreConfig {
                time_travel: false,
                ..Default::default()
            },
        ));

        let result = TimeTravel::attach(store, TimeTravelConfig::default());
        assert!(matches!(result, Err(StoreError::TimeTravelDisabled)));
    }

    #[test]
    fn test_attach_seeds_from_history() {
        let store = editor();
        store.dispatch(Edit::Push('a')).unwrap();
        store.dispatch(Edit::Push('b')).unwrap();
        store.undo().unwrap();

        let tt = TimeTravel::attach(Arc::clone(&store), TimeTravelConfig::default()).unwrap();
        let timeline = tt.timeline();
        assert_eq!(timeline.current_position(), 1);
        assert_eq!(timeline.max_position(), 2);

        tt.scrub_to(2).unwrap();
        assert_eq!(*store.state(), "ab");
    }

    #[test]
    fn test_dropping_coordinator_detaches() {
        let store = editor();
        let tt = TimeTravel::attach(Arc::clone(&store), TimeTravelConfig::default()).unwrap();
        assert_eq!(store.stats().subscriptions, 1);

        drop(tt);
        assert_eq!(store.stats().subscriptions, 0);
        store.dispatch(Edit::Pop).unwrap();
    }

    #[test]
    fn test_controls() {
        let (store, tt) = attached();
        assert_eq!(tt.controls(), Controls::default());

        store.dispatch(Edit::Push('a')).unwrap();
        store.undo().unwrap();
        let controls = tt.controls();
        assert!(!controls.can_undo);
        assert!(controls.can_redo);
        assert!(controls.can_reset);
        assert!(controls.can_play_pause);
        assert!(controls.can_scrub);

        store.redo().unwrap();
        let controls = tt.controls();
        assert!(controls.can_undo);
        assert!(!controls.can_redo);
        assert!(!controls.can_play_pause);
        store.undo().unwrap();

        tt.play().unwrap();
        assert_eq!(
            tt.controls(),
            Controls {
                can_play_pause: true,
                ..Default::default()
            }
        );
    }
}
