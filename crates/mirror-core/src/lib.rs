//! # Mirror Core
//!
//! Pure change-event translation for graph CDC replication.
//!
//! Models CDC change records as a discriminated sum, renders cypher
//! pattern fragments from them, and composes complete idempotent
//! mutation queries with parameter bindings. No I/O happens here.

pub mod compose;
pub mod error;
pub mod event;
pub mod pattern;

pub use compose::{compose, Mutation};
pub use error::EventError;
pub use event::{
    ChangeEvent, EntityChange, EntityState, NodeChange, RawEvent, RelationshipChange, StateChange,
};
