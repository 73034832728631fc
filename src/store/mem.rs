//! Memory-only backend: the graph's own maps are the only copy.

use crate::entity::Entity;
use crate::graph::Relationship;

use super::{GraphBackend, Snapshot, StoreResult};

/// Backend that stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryBackend;

impl GraphBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn put_entity(&self, _seq: u64, _entity: &Entity) -> StoreResult<()> {
        Ok(())
    }

    fn put_relationship(&self, _seq: u64, _relationship: &Relationship) -> StoreResult<()> {
        Ok(())
    }

    fn load(&self) -> StoreResult<Snapshot> {
        Ok(Snapshot::default())
    }
}
