//! Reducer registration and application.

use crate::error::{BoxError, Result, StoreError};
use crate::types::Action;
use std::fmt;
use std::sync::Arc;

type ReduceFn<S, A> = dyn Fn(&S, &A) -> std::result::Result<S, BoxError> + Send + Sync;

/// A reducer entry: an action name paired with a transition function.
pub struct On<S, A> {
    action: &'static str,
    reduce: Arc<ReduceFn<S, A>>,
}

impl<S, A> On<S, A> {
    /// Infallible reducer for the named action.
    pub fn new<F>(action: &'static str, reduce: F) -> Self
    where
        F: Fn(&S, &A) -> S + Send + Sync + 'static,
    {
        Self {
            action,
            reduce: Arc::new(move |state: &S, action: &A| -> std::result::Result<S, BoxError> {
                Ok(reduce(state, action))
            }),
        }
    }

    /// Reducer that may fail. A failure aborts the whole dispatch.
    pub fn try_new<F, E>(action: &'static str, reduce: F) -> Self
    where
        F: Fn(&S, &A) -> std::result::Result<S, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            action,
            reduce: Arc::new(move |state: &S, action: &A| -> std::result::Result<S, BoxError> {
                reduce(state, action).map_err(Into::into)
            }),
        }
    }

    /// Name of the action this entry reacts to.
    pub fn action(&self) -> &'static str {
        self.action
    }
}

impl<S, A> Clone for On<S, A> {
    fn clone(&self) -> Self {
        Self {
            action: self.action,
            reduce: Arc::clone(&self.reduce),
        }
    }
}

impl<S, A> fmt::Debug for On<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("On").field("action", &self.action).finish()
    }
}

/// Reducer registry, applied in registration order.
pub struct Reducers<S, A> {
    entries: Vec<On<S, A>>,
}

impl<S, A: Action> Reducers<S, A> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register an infallible reducer.
    pub fn on<F>(mut self, action: &'static str, reduce: F) -> Self
    where
        F: Fn(&S, &A) -> S + Send + Sync + 'static,
    {
        self.entries.push(On::new(action, reduce));
        self
    }

    /// Register a fallible reducer.
    pub fn try_on<F, E>(mut self, action: &'static str, reduce: F) -> Self
    where
        F: Fn(&S, &A) -> std::result::Result<S, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.entries.push(On::try_new(action, reduce));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply every matching entry in order, each consuming the previous output.
    ///
    /// Returns `Ok(None)` when no entry matches, leaving the state untouched.
    pub fn apply(&self, state: &S, action: &A) -> Result<Option<S>> {
        let name = action.name();
        let mut next: Option<S> = None;

        for entry in self.entries.iter().filter(|e| e.action == name) {
            let current = next.as_ref().unwrap_or(state);
            let reduced =
                (entry.reduce)(current, action).map_err(|e| StoreError::reducer(name, e))?;
            next = Some(reduced);
        }

        Ok(next)
    }
}

impl<S, A: Action> Default for Reducers<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> From<Vec<On<S, A>>> for Reducers<S, A> {
    fn from(entries: Vec<On<S, A>>) -> Self {
        Self { entries }
    }
}

impl<S, A> FromIterator<On<S, A>> for Reducers<S, A> {
    fn from_iter<I: IntoIterator<Item = On<S, A>>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
