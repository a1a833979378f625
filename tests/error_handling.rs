//! Error handling and edge case tests.

use rewind::{
    Action, EntityAdapter, OriginFilter, Reducers, Store, StoreConfig, StoreError,
    SubscriptionConfig, SubscriptionFilter, TimeTravel, TimeTravelConfig,
};
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
#[error("balance cannot go below zero (would be {0})")]
struct Overdrawn(i64);

#[derive(Debug, Clone, PartialEq)]
enum Ledger {
    Deposit(i64),
    Withdraw(i64),
    Audit,
}

impl Action for Ledger {
    fn name(&self) -> &'static str {
        match self {
            Ledger::Deposit(_) => "deposit",
            Ledger::Withdraw(_) => "withdraw",
            Ledger::Audit => "audit",
        }
    }
}

fn amount(action: &Ledger) -> i64 {
    match action {
        Ledger::Deposit(n) | Ledger::Withdraw(n) => *n,
        Ledger::Audit => 0,
    }
}

fn ledger_reducers() -> Reducers<i64, Ledger> {
    Reducers::<i64, Ledger>::new()
        .on("deposit", |balance, action| balance + amount(action))
        // Two entries for one action: a fee, then the checked withdrawal.
        .on("withdraw", |balance, _| balance - 1)
        .try_on("withdraw", |balance, action| {
            let next = balance - amount(action);
            if next < 0 {
                Err(Overdrawn(next))
            } else {
                Ok(next)
            }
        })
}

fn ledger() -> Store<i64, Ledger> {
    Store::new(0, ledger_reducers())
}

// --- Reducer Errors ---

#[test]
fn test_failing_reducer_aborts_whole_dispatch() {
    let store = ledger();
    store.dispatch(Ledger::Deposit(10)).unwrap();
    let events = store.subscribe(SubscriptionConfig::default());

    let err = store.dispatch(Ledger::Withdraw(50)).unwrap_err();

    // The fee entry ran before the failure but nothing was committed.
    assert_eq!(*store.state(), 10);
    assert_eq!(store.stats().undo_depth, 1);
    assert!(events.try_recv().is_err());

    match err {
        StoreError::ReducerFailed { action, .. } => assert_eq!(action, "withdraw"),
        other => panic!("Expected ReducerFailed, got {:?}", other),
    }
}

#[test]
fn test_reducer_error_keeps_source() {
    let store = ledger();
    let err = store.dispatch(Ledger::Withdraw(1)).unwrap_err();

    let source = err.source().expect("reducer error should carry its source");
    assert!(source.to_string().contains("would be -2"));
    assert!(err.to_string().contains("withdraw"));
}

#[test]
fn test_store_usable_after_failure() {
    let store = ledger();
    store.dispatch(Ledger::Deposit(5)).unwrap();
    assert!(store.dispatch(Ledger::Withdraw(100)).is_err());

    store.dispatch(Ledger::Withdraw(2)).unwrap();
    assert_eq!(*store.state(), 2);

    store.undo().unwrap();
    assert_eq!(*store.state(), 5);
}

#[test]
fn test_action_without_reducer() {
    let store = ledger();
    let dispatched = store.observe_action(OriginFilter::Dispatched);

    store.dispatch(Ledger::Audit).unwrap();

    assert_eq!(*store.state(), 0);
    assert!(store.can_undo());
    assert_eq!(*dispatched.try_recv().unwrap(), Ledger::Audit);

    // Undoing it is a no-op on the state but still a transition.
    let before = store.sequence();
    assert!(store.undo().unwrap());
    assert!(store.sequence() > before);
    assert_eq!(*store.state(), 0);
}

// --- History Edge Cases ---

#[test]
fn test_empty_undo_and_redo() {
    let store = ledger();
    let events = store.subscribe(SubscriptionConfig::default());

    assert!(!store.undo().unwrap());
    assert!(!store.redo().unwrap());
    assert!(events.try_recv().is_err());
}

#[test]
fn test_redo_at_end_is_noop() {
    let store = ledger();
    store.dispatch(Ledger::Deposit(3)).unwrap();
    store.undo().unwrap();
    store.redo().unwrap();

    let before = store.sequence();
    assert!(!store.redo().unwrap());
    assert_eq!(store.sequence(), before);
    assert_eq!(*store.state(), 3);
}

#[test]
fn test_reset_on_fresh_store() {
    let store = Store::new(7, ledger_reducers());
    store.reset().unwrap();

    assert_eq!(*store.state(), 7);
    assert!(!store.can_undo());
    assert!(!store.can_redo());
}

#[test]
fn test_history_disabled_still_publishes() {
    let store = Store::with_config(
        0,
        ledger_reducers(),
        StoreConfig {
            time_travel: false,
            ..Default::default()
        },
    );
    let dispatched = store.observe_action(OriginFilter::All);

    store.dispatch(Ledger::Deposit(4)).unwrap();

    assert_eq!(*store.state(), 4);
    assert!(!store.redo().unwrap());
    assert_eq!(dispatched.drain().len(), 1);
    assert!(store.history().past.is_empty());
}

// --- Reentrancy ---

#[test]
fn test_transition_from_subscriber_is_rejected() {
    let store = Arc::new(ledger());
    let outcomes = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let inner = Arc::clone(&store);
    let sink = Arc::clone(&outcomes);
    store.listen(SubscriptionFilter::state_changes(), move |_| {
        let results = [
            inner.dispatch(Ledger::Deposit(1)).map(|_| true),
            inner.undo(),
            inner.redo(),
            inner.reset().map(|_| true),
        ];
        sink.lock().extend(
            results
                .into_iter()
                .map(|r| matches!(r, Err(StoreError::ReentrantTransition))),
        );
    });

    store.dispatch(Ledger::Deposit(2)).unwrap();

    assert_eq!(*outcomes.lock(), vec![true; 4]);
    assert_eq!(*store.state(), 2);
    assert_eq!(store.stats().undo_depth, 1);
}

#[test]
fn test_panicking_subscriber_does_not_wedge_store() {
    let store = Arc::new(ledger());
    let armed = Arc::new(AtomicBool::new(true));
    let trigger = Arc::clone(&armed);
    store.listen(SubscriptionFilter::actions(OriginFilter::All), move |_| {
        if trigger.swap(false, Ordering::SeqCst) {
            panic!("subscriber failure");
        }
    });

    let panicking = Arc::clone(&store);
    let result = std::thread::spawn(move || panicking.dispatch(Ledger::Deposit(1))).join();
    assert!(result.is_err());

    // The transition committed before notification.
    assert_eq!(*store.state(), 1);
    assert!(store.undo().unwrap());
    assert_eq!(*store.state(), 0);
}

// --- Time Travel Errors ---

#[test]
fn test_attach_to_store_without_history() {
    let store = Arc::new(Store::with_config(
        0,
        ledger_reducers(),
        StoreConfig {
            time_travel: false,
            ..Default::default()
        },
    ));

    let err = TimeTravel::attach(store, TimeTravelConfig::default())
        .err()
        .expect("attach should fail");
    assert!(matches!(err, StoreError::TimeTravelDisabled));
}

#[test]
fn test_scrub_past_end() {
    let store = Arc::new(ledger());
    let tt = TimeTravel::attach(Arc::clone(&store), TimeTravelConfig::default()).unwrap();
    store.dispatch(Ledger::Deposit(1)).unwrap();
    store.dispatch(Ledger::Deposit(1)).unwrap();

    let err = tt.scrub_to(3).unwrap_err();
    assert!(matches!(
        err,
        StoreError::PositionOutOfRange {
            requested: 3,
            max: 2
        }
    ));
    assert_eq!(tt.timeline().current_position(), 2);
    assert_eq!(*store.state(), 2);
}

#[test]
fn test_tick_without_playback() {
    let store = Arc::new(ledger());
    let tt = TimeTravel::attach(Arc::clone(&store), TimeTravelConfig::default()).unwrap();
    store.dispatch(Ledger::Deposit(1)).unwrap();
    store.undo().unwrap();

    assert!(!tt.tick().unwrap());
    assert_eq!(*store.state(), 0);
}

// --- Entity Edge Cases ---

#[test]
fn test_entity_operations_on_absent_ids() {
    let adapter = EntityAdapter::new(|pair: &(u8, &'static str)| pair.0);
    let state = adapter.set_all([(1, "one"), (2, "two")]);

    assert_eq!(adapter.remove_one(&9, &state), state);
    assert_eq!(adapter.remove_many([&8, &9], &state), state);
    assert_eq!(adapter.map_one(&9, |p| *p, &state), state);
    assert!(adapter.entity_by_id(&state, &9).is_none());
}

#[test]
fn test_add_does_not_overwrite() {
    let adapter = EntityAdapter::new(|pair: &(u8, &'static str)| pair.0);
    let state = adapter.add_one((1, "first"), &adapter.initial_state());
    let state = adapter.add_many([(1, "second"), (2, "two"), (2, "dup")], &state);

    assert_eq!(state.get(&1), Some(&(1, "first")));
    assert_eq!(state.get(&2), Some(&(2, "two")));
    assert_eq!(state.ids(), &[1, 2]);
}
