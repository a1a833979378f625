//! Error types for the store.

use thiserror::Error;

/// Boxed error returned by fallible reducers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A reducer failed while transitioning state. Nothing was committed.
    #[error("Reducer for action `{action}` failed: {source}")]
    ReducerFailed {
        action: &'static str,
        #[source]
        source: BoxError,
    },

    /// A subscriber tried to start a transition on the store that is
    /// currently notifying it.
    #[error("Transition started from inside a subscriber notification")]
    ReentrantTransition,

    #[error("Time travel is disabled on this store")]
    TimeTravelDisabled,

    #[error("Position {requested} is out of range (max is {max})")]
    PositionOutOfRange { requested: usize, max: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Wrap a reducer failure for the given action name.
    pub fn reducer(action: &'static str, source: impl Into<BoxError>) -> Self {
        StoreError::ReducerFailed {
            action,
            source: source.into(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
