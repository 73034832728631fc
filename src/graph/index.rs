//! In-memory knowledge graph: entity and relationship stores.
//!
//! Both stores are insertion-ordered maps. Upserts replace the record in
//! place, so an entity or relationship keeps its original encounter position.
//! Every write goes through to the configured [`GraphBackend`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Utc;
use indexmap::IndexMap;
use serde::Serialize;

use crate::entity::{Entity, EntityId, EntityKind, Properties};
use crate::store::{DurableBackend, GraphBackend, MemoryBackend, StoreResult};

use super::{Direction, RelatedEntity, RelationKind, Relationship, RelationshipKey};

/// Backend selection for a knowledge graph.
#[derive(Debug, Clone, Default)]
pub struct GraphConfig {
    /// Directory for the redb file. `None` for memory-only mode.
    pub data_dir: Option<PathBuf>,
}

/// Counts per entity kind plus the relationship total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub entities_by_kind: BTreeMap<String, usize>,
    pub entity_count: usize,
    pub relationship_count: usize,
}

/// Entity and relationship store.
///
/// Writes take `&mut self`; there is no internal locking. Analysis and
/// queries only need `&self`.
pub struct KnowledgeGraph {
    entities: IndexMap<EntityId, Entity>,
    relationships: IndexMap<RelationshipKey, Relationship>,
    backend: Box<dyn GraphBackend>,
}

impl KnowledgeGraph {
    /// Create an empty memory-only graph.
    pub fn new() -> Self {
        Self {
            entities: IndexMap::new(),
            relationships: IndexMap::new(),
            backend: Box::new(MemoryBackend),
        }
    }

    /// Create a graph over `backend`, reloading whatever it already holds.
    pub fn with_backend(backend: Box<dyn GraphBackend>) -> StoreResult<Self> {
        let snapshot = backend.load()?;
        let mut graph = Self {
            entities: IndexMap::with_capacity(snapshot.entities.len()),
            relationships: IndexMap::with_capacity(snapshot.relationships.len()),
            backend,
        };
        for entity in snapshot.entities {
            graph.entities.insert(entity.id.clone(), entity);
        }
        for rel in snapshot.relationships {
            graph.relationships.insert(rel.key.clone(), rel);
        }
        tracing::info!(
            backend = graph.backend.name(),
            entities = graph.entities.len(),
            relationships = graph.relationships.len(),
            "knowledge graph loaded"
        );
        Ok(graph)
    }

    /// Open a graph according to `config`.
    ///
    /// If the durable backend cannot be opened or read, the graph falls back
    /// to memory-only mode and logs a warning instead of failing.
    pub fn open(config: &GraphConfig) -> Self {
        let Some(dir) = &config.data_dir else {
            return Self::new();
        };
        match DurableBackend::open(dir).and_then(|b| Self::with_backend(Box::new(b))) {
            Ok(graph) => graph,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    dir = %dir.display(),
                    "durable backend unavailable, continuing in memory"
                );
                Self::new()
            }
        }
    }

    /// Name of the active backend ("memory" or "redb").
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Insert or replace an entity. `created_at` is reset to now.
    pub fn add_entity(&mut self, mut entity: Entity) -> &Entity {
        entity.created_at = Utc::now();
        tracing::debug!(kind = %entity.kind, id = %entity.id, "added entity");
        let (idx, _) = self.entities.insert_full(entity.id.clone(), entity);
        let stored = &self.entities[idx];
        if let Err(e) = self.backend.put_entity(idx as u64, stored) {
            tracing::warn!(error = %e, id = %stored.id, "failed to persist entity");
        }
        stored
    }

    /// Insert or replace the relationship identified by `(from, kind, to)`.
    pub fn add_relationship(
        &mut self,
        from: impl Into<EntityId>,
        to: impl Into<EntityId>,
        kind: impl Into<RelationKind>,
        properties: Properties,
    ) -> &Relationship {
        let key = RelationshipKey::new(from.into(), kind.into(), to.into());
        tracing::debug!(relationship = %key, "added relationship");
        let rel = Relationship {
            key: key.clone(),
            properties,
            created_at: Utc::now(),
        };
        let (idx, _) = self.relationships.insert_full(key, rel);
        let stored = &self.relationships[idx];
        if let Err(e) = self.backend.put_relationship(idx as u64, stored) {
            tracing::warn!(error = %e, relationship = %stored.key, "failed to persist relationship");
        }
        stored
    }

    /// Link a task to a debt it involves (default kind `related_to`).
    pub fn link_task_to_debt(
        &mut self,
        task_id: impl Into<EntityId>,
        debt_id: impl Into<EntityId>,
        kind: Option<RelationKind>,
    ) -> &Relationship {
        self.add_relationship(
            task_id,
            debt_id,
            kind.unwrap_or(RelationKind::RelatedTo),
            reason("Task involves debt management"),
        )
    }

    /// Link a task to a bureaucratic process (default kind `related_to`).
    pub fn link_task_to_bureaucracy(
        &mut self,
        task_id: impl Into<EntityId>,
        bureaucracy_id: impl Into<EntityId>,
        kind: Option<RelationKind>,
    ) -> &Relationship {
        self.add_relationship(
            task_id,
            bureaucracy_id,
            kind.unwrap_or(RelationKind::RelatedTo),
            reason("Task involves bureaucratic process"),
        )
    }

    /// Look up an entity by id.
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Look up a relationship by its identity triple.
    pub fn relationship(&self, key: &RelationshipKey) -> Option<&Relationship> {
        self.relationships.get(key)
    }

    /// All entities in encounter order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Entities of one kind, in encounter order.
    pub fn entities_of_kind<'a>(&'a self, kind: &'a EntityKind) -> impl Iterator<Item = &'a Entity> {
        self.entities.values().filter(move |e| &e.kind == kind)
    }

    /// All relationships in encounter order.
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }

    /// Entities connected to `entity_id` in either direction.
    ///
    /// `kinds` restricts the relationship kinds considered. Relationships
    /// whose other endpoint is not in the graph are skipped.
    pub fn find_related(&self, entity_id: &str, kinds: Option<&[RelationKind]>) -> Vec<RelatedEntity> {
        self.relationships
            .values()
            .filter(|rel| rel.key.from.as_str() == entity_id || rel.key.to.as_str() == entity_id)
            .filter(|rel| kinds.is_none_or(|ks| ks.contains(&rel.key.kind)))
            .filter_map(|rel| {
                let outgoing = rel.key.from.as_str() == entity_id;
                let other = if outgoing { &rel.key.to } else { &rel.key.from };
                let entity = self.entities.get(other)?;
                Some(RelatedEntity {
                    entity: entity.clone(),
                    relationship: rel.clone(),
                    direction: if outgoing {
                        Direction::Outgoing
                    } else {
                        Direction::Incoming
                    },
                })
            })
            .collect()
    }

    /// Entity counts per kind and the relationship total.
    pub fn stats(&self) -> GraphStats {
        let mut entities_by_kind = BTreeMap::new();
        for entity in self.entities.values() {
            *entities_by_kind
                .entry(entity.kind.as_label().to_string())
                .or_insert(0) += 1;
        }
        GraphStats {
            entities_by_kind,
            entity_count: self.entities.len(),
            relationship_count: self.relationships.len(),
        }
    }
}

fn reason(text: &str) -> Properties {
    let mut props = Properties::new();
    props.insert("reason".into(), text.into());
    props.insert("createdAt".into(), Utc::now().to_rfc3339().into());
    props
}

impl Default for KnowledgeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KnowledgeGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeGraph")
            .field("backend", &self.backend.name())
            .field("entities", &self.entities.len())
            .field("relationships", &self.relationships.len())
            .finish()
    }
}
