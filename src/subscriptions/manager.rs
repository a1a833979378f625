//! Subscription manager for broadcasting store events.

use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{trace, warn};

use super::types::{
    DropReason, StoreEvent, SubscriptionConfig, SubscriptionFilter, SubscriptionHandle,
    SubscriptionId,
};

/// Synchronous subscriber. Returning `false` unsubscribes it.
pub(crate) type Callback<S, A> = dyn Fn(&StoreEvent<S, A>) -> bool + Send + Sync;

/// Where a subscription delivers its events.
enum Sink<S, A> {
    Channel(Sender<StoreEvent<S, A>>),
    Callback(Arc<Callback<S, A>>),
}

impl<S, A> Clone for Sink<S, A> {
    fn clone(&self) -> Self {
        match self {
            Sink::Channel(sender) => Sink::Channel(sender.clone()),
            Sink::Callback(callback) => Sink::Callback(Arc::clone(callback)),
        }
    }
}

/// Internal subscription state.
struct Subscription<S, A> {
    filter: SubscriptionFilter,
    sink: Sink<S, A>,
}

/// Outcome of delivering one event to one sink.
enum Delivery {
    Delivered,
    Dropped(DropReason),
}

impl<S, A> Sink<S, A> {
    fn deliver(&self, event: &StoreEvent<S, A>) -> Delivery {
        match self {
            Sink::Channel(sender) => match sender.try_send(event.clone()) {
                Ok(()) => Delivery::Delivered,
                Err(TrySendError::Full(_)) => Delivery::Dropped(DropReason::BufferOverflow),
                Err(TrySendError::Disconnected(_)) => {
                    Delivery::Dropped(DropReason::Disconnected)
                }
            },
            Sink::Callback(callback) => {
                if callback(event) {
                    Delivery::Delivered
                } else {
                    Delivery::Dropped(DropReason::Disconnected)
                }
            }
        }
    }
}

/// Manages subscriptions and broadcasts events in registration order.
pub struct SubscriptionManager<S, A> {
    /// Active subscriptions, ordered by id.
    subscriptions: RwLock<BTreeMap<SubscriptionId, Subscription<S, A>>>,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
}

impl<S, A> SubscriptionManager<S, A> {
    /// Create a new subscription manager.
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn allocate_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Create a channel subscription.
    pub fn subscribe(&self, config: SubscriptionConfig) -> SubscriptionHandle<S, A> {
        let id = self.allocate_id();
        let (sender, receiver) = bounded(config.buffer_size);

        self.subscriptions.write().insert(
            id,
            Subscription {
                filter: config.filter,
                sink: Sink::Channel(sender),
            },
        );

        SubscriptionHandle { id, receiver }
    }

    /// Register a synchronous callback. It stays registered until it
    /// returns `false` or is unsubscribed.
    pub(crate) fn listen(
        &self,
        filter: SubscriptionFilter,
        callback: Arc<Callback<S, A>>,
    ) -> SubscriptionId {
        let id = self.allocate_id();
        self.subscriptions.write().insert(
            id,
            Subscription {
                filter,
                sink: Sink::Callback(callback),
            },
        );
        id
    }

    /// Unsubscribe and clean up.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.subscriptions.write().remove(&id);
        match removed {
            Some(Subscription {
                sink: Sink::Channel(sender),
                ..
            }) => {
                // Best effort
                let _ = sender.try_send(StoreEvent::Dropped {
                    reason: DropReason::Unsubscribed,
                });
                true
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Get subscription count.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Deliver an event to every matching subscription, in registration order.
    ///
    /// Sinks are collected first and invoked without holding the registry
    /// lock, so callbacks may subscribe or unsubscribe freely.
    pub fn broadcast(&self, event: &StoreEvent<S, A>) {
        let targets: Vec<(SubscriptionId, Sink<S, A>)> = {
            let subs = self.subscriptions.read();
            subs.iter()
                .filter(|(_, sub)| sub.filter.matches(event))
                .map(|(id, sub)| (*id, sub.sink.clone()))
                .collect()
        };

        trace!(subscribers = targets.len(), "broadcasting store event");

        let mut to_remove = Vec::new();
        for (id, sink) in targets {
            if let Delivery::Dropped(reason) = sink.deliver(event) {
                to_remove.push((id, reason));
            }
        }

        // Remove dropped subscriptions
        if !to_remove.is_empty() {
            let mut subs = self.subscriptions.write();
            for (id, reason) in to_remove {
                if let Some(sub) = subs.remove(&id) {
                    if reason == DropReason::BufferOverflow {
                        warn!(subscription = id.0, "dropping slow subscriber");
                    }
                    if let Sink::Channel(sender) = sub.sink {
                        // Might fail, that's ok
                        let _ = sender.try_send(StoreEvent::Dropped { reason });
                    }
                }
            }
        }
    }
}

impl<S, A> Default for SubscriptionManager<S, A> {
    fn default() -> Self {
        Self::new()
    }
}
