//! Entity adapter: pure operations over `EntityState`.

use super::state::EntityState;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tracing::warn;

type SelectId<K, T> = dyn Fn(&T) -> K + Send + Sync;

/// Manages a normalized, order-preserving collection of entities.
///
/// Every operation takes the collection by reference and returns a new one.
pub struct EntityAdapter<K, T> {
    select_id: Arc<SelectId<K, T>>,
}

impl<K, T> EntityAdapter<K, T>
where
    K: Eq + Hash + Clone,
{
    /// Create an adapter from an id-extraction function.
    pub fn new<F>(select_id: F) -> Self
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self {
            select_id: Arc::new(select_id),
        }
    }

    /// Id of an entity.
    pub fn id_of(&self, entity: &T) -> K {
        (self.select_id)(entity)
    }

    /// An empty collection.
    pub fn initial_state(&self) -> EntityState<K, T> {
        EntityState::new()
    }

    // --- Writes ---

    /// Insert or replace one entity.
    ///
    /// A replaced entity keeps its ordinal position; a new one is appended.
    pub fn upsert_one(&self, entity: T, state: &EntityState<K, T>) -> EntityState<K, T> {
        let mut next = state.clone();
        self.upsert_into(&mut next, entity);
        next
    }

    /// Upsert each entity in input order. Later duplicates win.
    pub fn upsert_many<I>(&self, entities: I, state: &EntityState<K, T>) -> EntityState<K, T>
    where
        I: IntoIterator<Item = T>,
    {
        let mut next = state.clone();
        for entity in entities {
            self.upsert_into(&mut next, entity);
        }
        next
    }

    /// Insert one entity unless its id is already present.
    pub fn add_one(&self, entity: T, state: &EntityState<K, T>) -> EntityState<K, T> {
        self.add_many(std::iter::once(entity), state)
    }

    /// Insert entities whose ids are not present yet. Earlier duplicates win.
    pub fn add_many<I>(&self, entities: I, state: &EntityState<K, T>) -> EntityState<K, T>
    where
        I: IntoIterator<Item = T>,
    {
        let mut next = state.clone();
        for entity in entities {
            let id = self.id_of(&entity);
            if !next.entities.contains_key(&id) {
                next.ids.push(id.clone());
                next.entities.insert(id, Arc::new(entity));
            }
        }
        next
    }

    /// Replace the whole collection.
    pub fn set_all<I>(&self, entities: I) -> EntityState<K, T>
    where
        I: IntoIterator<Item = T>,
    {
        self.upsert_many(entities, &EntityState::new())
    }

    /// Rewrite one entity in place. Absent ids are a no-op.
    ///
    /// An update that changes the entity's id is discarded and the state is
    /// returned unchanged.
    pub fn map_one<F>(&self, id: &K, f: F, state: &EntityState<K, T>) -> EntityState<K, T>
    where
        F: FnOnce(&T) -> T,
    {
        let Some(current) = state.entities.get(id) else {
            return state.clone();
        };
        let updated = f(current);
        if self.id_of(&updated) != *id {
            warn!("map_one changed the entity id, update discarded");
            return state.clone();
        }

        let mut next = state.clone();
        next.entities.insert(id.clone(), Arc::new(updated));
        next
    }

    /// Remove one entity. Absent ids are a no-op.
    pub fn remove_one(&self, id: &K, state: &EntityState<K, T>) -> EntityState<K, T> {
        if !state.entities.contains_key(id) {
            return state.clone();
        }
        let mut next = state.clone();
        next.entities.remove(id);
        next.ids.retain(|k| k != id);
        next
    }

    /// Remove several entities. Absent ids are skipped.
    pub fn remove_many<'a, I>(&self, ids: I, state: &EntityState<K, T>) -> EntityState<K, T>
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        let doomed: HashSet<&K> = ids
            .into_iter()
            .filter(|id| state.entities.contains_key(*id))
            .collect();
        if doomed.is_empty() {
            return state.clone();
        }

        let mut next = state.clone();
        for id in &doomed {
            next.entities.remove(*id);
        }
        next.ids.retain(|k| !doomed.contains(k));
        next
    }

    /// Remove everything.
    pub fn remove_all(&self, _state: &EntityState<K, T>) -> EntityState<K, T> {
        EntityState::new()
    }

    // --- Selectors ---

    /// All entities in order.
    pub fn all_entities(&self, state: &EntityState<K, T>) -> Vec<Arc<T>> {
        state
            .ids
            .iter()
            .filter_map(|id| state.entities.get(id).cloned())
            .collect()
    }

    /// Entity by id, if present.
    pub fn entity_by_id(&self, state: &EntityState<K, T>, id: &K) -> Option<Arc<T>> {
        state.entities.get(id).cloned()
    }

    fn upsert_into(&self, state: &mut EntityState<K, T>, entity: T) {
        let id = self.id_of(&entity);
        if state.entities.insert(id.clone(), Arc::new(entity)).is_none() {
            state.ids.push(id);
        }
    }
}

impl<K, T> Clone for EntityAdapter<K, T> {
    fn clone(&self) -> Self {
        Self {
            select_id: Arc::clone(&self.select_id),
        }
    }
}

impl<K, T> fmt::Debug for EntityAdapter<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityAdapter").finish_non_exhaustive()
    }
}
