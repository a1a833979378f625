//! Normalized entity collections.
//!
//! An `EntityState` keeps entities by id plus the order they were first
//! inserted in; an `EntityAdapter` knows how to pull the id out of an entity
//! and produces updated collections without touching its input.

mod adapter;
mod state;

pub use adapter::EntityAdapter;
pub use state::EntityState;
