//! Knowledge graph: entities plus directed, typed relationships.
//!
//! - [`index::KnowledgeGraph`]: the in-memory store with fixed lookups
//! - [`search`]: keyword search over entities and relationships
//! - [`similarity`]: task-to-task similarity scoring
//!
//! Relationship identity is the `(from, kind, to)` triple held in an explicit
//! [`RelationshipKey`], so ids containing any separator cannot collide.

pub mod index;
pub mod search;
pub mod similarity;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId, Properties};

/// Edge type. Caller-defined kinds are kept as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationKind {
    DependsOn,
    Blocks,
    RelatedTo,
    Custom(String),
}

impl RelationKind {
    /// The three kinds the dependency-chain detector follows.
    pub const DEPENDENCY_KINDS: [RelationKind; 3] = [
        RelationKind::DependsOn,
        RelationKind::Blocks,
        RelationKind::RelatedTo,
    ];

    pub fn as_label(&self) -> &str {
        match self {
            Self::DependsOn => "depends_on",
            Self::Blocks => "blocks",
            Self::RelatedTo => "related_to",
            Self::Custom(tag) => tag,
        }
    }

    pub fn from_label(s: &str) -> Self {
        match s {
            "depends_on" => Self::DependsOn,
            "blocks" => Self::Blocks,
            "related_to" => Self::RelatedTo,
            _ => Self::Custom(s.to_string()),
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl From<String> for RelationKind {
    fn from(s: String) -> Self {
        Self::from_label(&s)
    }
}

impl From<&str> for RelationKind {
    fn from(s: &str) -> Self {
        Self::from_label(s)
    }
}

impl From<RelationKind> for String {
    fn from(kind: RelationKind) -> Self {
        kind.as_label().to_string()
    }
}

/// Identity of a relationship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipKey {
    pub from: EntityId,
    pub kind: RelationKind,
    pub to: EntityId,
}

impl RelationshipKey {
    pub fn new(from: EntityId, kind: RelationKind, to: EntityId) -> Self {
        Self { from, kind, to }
    }
}

impl fmt::Display for RelationshipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) -[{}]-> ({})", self.from, self.kind, self.to)
    }
}

/// A directed, typed edge between two entity ids.
///
/// Endpoints are not required to exist in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub key: RelationshipKey,
    pub properties: Properties,
    pub created_at: DateTime<Utc>,
}

impl Relationship {
    pub fn from_id(&self) -> &EntityId {
        &self.key.from
    }

    pub fn to_id(&self) -> &EntityId {
        &self.key.to
    }

    pub fn kind(&self) -> &RelationKind {
        &self.key.kind
    }

    /// `kind` followed by the serialized properties, used for keyword search.
    pub fn searchable_text(&self) -> String {
        format!(
            "{} {}",
            self.key.kind,
            serde_json::Value::Object(self.properties.clone())
        )
    }
}

/// Direction of a relationship relative to the queried entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// One hit from [`index::KnowledgeGraph::find_related`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedEntity {
    /// The entity at the other end.
    pub entity: Entity,
    pub relationship: Relationship,
    pub direction: Direction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_kind_labels() {
        assert_eq!(RelationKind::from_label("blocks"), RelationKind::Blocks);
        assert_eq!(
            RelationKind::from_label("funds"),
            RelationKind::Custom("funds".into())
        );
        assert_eq!(RelationKind::DependsOn.to_string(), "depends_on");
    }

    #[test]
    fn keys_with_separator_characters_stay_distinct() {
        // Both would join to "a_related_to_b_related_to_c".
        let k1 = RelationshipKey::new("a_related_to_b".into(), RelationKind::RelatedTo, "c".into());
        let k2 = RelationshipKey::new("a".into(), RelationKind::RelatedTo, "b_related_to_c".into());
        assert_ne!(k1, k2);
    }
}
