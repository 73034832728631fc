//! Storage backends for the knowledge graph.
//!
//! The graph keeps its authoritative state in memory and writes through to a
//! [`GraphBackend`] chosen at construction:
//!
//! - [`MemoryBackend`]: no-op, all data is lost on drop
//! - [`DurableBackend`]: redb file, reloaded on open
//!
//! Write-through failures never reach the caller of the graph; they are
//! logged and the in-memory state stays authoritative.

pub mod durable;
pub mod mem;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use durable::DurableBackend;
pub use mem::MemoryBackend;

use crate::entity::Entity;
use crate::error::StoreError;
use crate::graph::Relationship;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Everything a backend holds, in encounter order.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
}

/// A record tagged with its position in the graph's encounter order.
///
/// Backends that iterate in key order use `seq` to restore the original order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequenced<T> {
    pub seq: u64,
    pub record: T,
}

/// Persistence capability of a knowledge graph.
pub trait GraphBackend: fmt::Debug + Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Store or replace an entity.
    fn put_entity(&self, seq: u64, entity: &Entity) -> StoreResult<()>;

    /// Store or replace a relationship.
    fn put_relationship(&self, seq: u64, relationship: &Relationship) -> StoreResult<()>;

    /// Read back everything previously stored, ordered by `seq`.
    fn load(&self) -> StoreResult<Snapshot>;
}
