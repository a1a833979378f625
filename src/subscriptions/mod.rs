//! Subscription system for live store updates.
//!
//! This module provides in-process subscriptions to store events:
//! - Committed state changes
//! - Actions, tagged with the origin that put them on the stream
//! - Reset markers
//!
//! Subscriptions support:
//! - Filtering by event kind and action origin
//! - Bounded buffers with slow-subscriber dropping
//! - Synchronous callbacks, notified in registration order after commit
//!
//! # Example
//!
//! ```ignore
//! let handle = store.subscribe(SubscriptionConfig {
//!     filter: SubscriptionFilter::actions(OriginFilter::Undone),
//!     ..Default::default()
//! });
//!
//! loop {
//!     match handle.recv() {
//!         Ok(StoreEvent::Action { action, .. }) => println!("Undid {:?}", action),
//!         Ok(StoreEvent::Dropped { reason }) => break,
//!         Ok(_) => {}
//!         Err(_) => break,
//!     }
//! }
//! ```

mod manager;
mod types;

pub use manager::SubscriptionManager;
pub use types::{
    DropReason, Selection, StoreEvent, SubscriptionConfig, SubscriptionFilter,
    SubscriptionHandle, SubscriptionId,
};
