//! Normalized collection value.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// An id-to-entity map plus the ordered id sequence defining iteration order.
///
/// The map's keys and the order sequence's elements are always the same set,
/// without duplicates. Only `EntityAdapter` produces new values; each one is
/// a fresh collection sharing entities with its predecessor through `Arc`.
/// Deserialization rejects input where the two disagree.
#[derive(Serialize)]
#[serde(bound(serialize = "K: Eq + Hash + Serialize, T: Serialize"))]
pub struct EntityState<K, T> {
    pub(super) ids: Vec<K>,
    pub(super) entities: HashMap<K, Arc<T>>,
}

impl<K: Eq + Hash + Clone, T> EntityState<K, T> {
    pub fn new() -> Self {
        Self {
            ids: Vec::new(),
            entities: HashMap::new(),
        }
    }

    /// Ids in iteration order.
    pub fn ids(&self) -> &[K] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &K) -> bool {
        self.entities.contains_key(id)
    }

    /// Entity by id.
    pub fn get(&self, id: &K) -> Option<&T> {
        self.entities.get(id).map(Arc::as_ref)
    }

    /// Entities in order-sequence order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.ids
            .iter()
            .filter_map(move |id| self.entities.get(id).map(Arc::as_ref))
    }

    /// Ordinal position of an id.
    pub fn position(&self, id: &K) -> Option<usize> {
        self.ids.iter().position(|k| k == id)
    }

    /// Check the map/order bijection.
    pub fn is_consistent(&self) -> bool {
        if self.ids.len() != self.entities.len() {
            return false;
        }
        let mut seen = HashSet::with_capacity(self.ids.len());
        self.ids
            .iter()
            .all(|id| self.entities.contains_key(id) && seen.insert(id))
    }
}

/// Wire shape of `EntityState`, checked before it becomes one.
#[derive(Deserialize)]
#[serde(bound(deserialize = "K: Eq + Hash + Deserialize<'de>, T: Deserialize<'de>"))]
struct RawEntityState<K, T> {
    ids: Vec<K>,
    entities: HashMap<K, Arc<T>>,
}

impl<'de, K, T> Deserialize<'de> for EntityState<K, T>
where
    K: Eq + Hash + Clone + Deserialize<'de>,
    T: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawEntityState::deserialize(deserializer)?;
        let state = EntityState {
            ids: raw.ids,
            entities: raw.entities,
        };
        if !state.is_consistent() {
            return Err(de::Error::custom(format!(
                "{} ids do not match {} entities one to one",
                state.ids.len(),
                state.entities.len()
            )));
        }
        Ok(state)
    }
}

impl<K: Eq + Hash + Clone, T> Default for EntityState<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, T> Clone for EntityState<K, T> {
    fn clone(&self) -> Self {
        Self {
            ids: self.ids.clone(),
            entities: self.entities.clone(),
        }
    }
}

impl<K: Eq + Hash, T: PartialEq> PartialEq for EntityState<K, T> {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids && self.entities == other.entities
    }
}

impl<K: Eq + Hash, T: Eq> Eq for EntityState<K, T> {}

impl<K: Eq + Hash + fmt::Debug, T: fmt::Debug> fmt::Debug for EntityState<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.ids.iter().map(|id| (id, self.entities.get(id))))
            .finish()
    }
}
