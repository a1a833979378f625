//! Core types for the store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Flattened field-name to string-value mapping describing an action.
pub type Fields = BTreeMap<&'static str, String>;

/// An intended state transition.
///
/// `name` identifies the variant: reducers are registered against it.
/// `describe` enumerates the action's fields for analytics collaborators,
/// so no runtime introspection is needed.
pub trait Action: fmt::Debug + Send + Sync + 'static {
    /// Variant name used for reducer matching and tracking.
    fn name(&self) -> &'static str;

    /// Field names and their rendered values.
    fn describe(&self) -> Fields {
        Fields::new()
    }
}

/// Position in a store's transition stream.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Sequence(pub u64);

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seq({})", self.0)
    }
}

impl Sequence {
    pub fn next(self) -> Self {
        Sequence(self.0 + 1)
    }
}

/// Why an action appeared on the action stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOrigin {
    /// A new action passed through the reducers.
    Dispatched,
    /// The transition produced by this action was reverted.
    Undone,
    /// The transition produced by this action was reinstated.
    Redone,
}

/// Which origins an action observer wants to see.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginFilter {
    #[default]
    All,
    Dispatched,
    Undone,
    Redone,
}

impl OriginFilter {
    pub fn accepts(self, origin: ActionOrigin) -> bool {
        match self {
            OriginFilter::All => true,
            OriginFilter::Dispatched => origin == ActionOrigin::Dispatched,
            OriginFilter::Undone => origin == ActionOrigin::Undone,
            OriginFilter::Redone => origin == ActionOrigin::Redone,
        }
    }
}

impl From<ActionOrigin> for OriginFilter {
    fn from(origin: ActionOrigin) -> Self {
        match origin {
            ActionOrigin::Dispatched => OriginFilter::Dispatched,
            ActionOrigin::Undone => OriginFilter::Undone,
            ActionOrigin::Redone => OriginFilter::Redone,
        }
    }
}

/// An action as handed to an analytics collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedAction {
    pub name: String,
    pub fields: BTreeMap<String, String>,
}

impl TrackedAction {
    /// Build from any action using its field description.
    pub fn from_action<A: Action + ?Sized>(action: &A) -> Self {
        Self {
            name: action.name().to_string(),
            fields: action
                .describe()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    /// JSON rendering, for sinks that want one.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "fields": self.fields,
        })
    }
}

/// Actions currently held in a store's undo/redo history.
#[derive(Debug)]
pub struct History<A> {
    /// Actions behind the current state, oldest first.
    pub past: Vec<Arc<A>>,
    /// Undone actions, next redo first.
    pub future: Vec<Arc<A>>,
}

impl<A> Clone for History<A> {
    fn clone(&self) -> Self {
        Self {
            past: self.past.clone(),
            future: self.future.clone(),
        }
    }
}

impl<A> Default for History<A> {
    fn default() -> Self {
        Self {
            past: Vec::new(),
            future: Vec::new(),
        }
    }
}

/// Store statistics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StoreStats {
    /// Transitions committed since construction (dispatch, undo, redo, reset).
    pub sequence: Sequence,
    pub undo_depth: usize,
    pub redo_depth: usize,
    pub subscriptions: usize,
    pub reducers: usize,
}
