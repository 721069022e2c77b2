//! # Mirror Graph
//!
//! Neo4j integration for graph-mirror.
//!
//! Provides the connection client for source and sink, the replication
//! cursor (in-memory cell plus its durable mirror on the sink), and the
//! replication loop that applies translated change events in order.

pub mod client;
pub mod cursor;
pub mod params;
pub mod replicator;
pub mod seed;

pub use client::{GraphClient, GraphConfig};
pub use cursor::Cursor;
pub use params::bolt_value;
pub use replicator::{Pacing, Replicator, ReplicatorConfig};
pub use seed::seed_triples;
