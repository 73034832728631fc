//! Entities: typed records held in the knowledge graph.
//!
//! An entity is an id, a kind tag and an insertion-ordered JSON property map.
//! The analyzer reads a handful of well-known property keys (`deadline`,
//! `category`, `entity`, `status`, `amount`, ...); everything else is carried
//! through untouched.

use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Property map. Key order is preserved (`serde_json` with `preserve_order`).
pub type Properties = serde_json::Map<String, Value>;

/// Caller-assigned entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// What kind of record an entity is. Unknown tags are kept as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityKind {
    Task,
    Debt,
    Bureaucracy,
    Person,
    Organization,
    Custom(String),
}

impl EntityKind {
    pub fn as_label(&self) -> &str {
        match self {
            Self::Task => "task",
            Self::Debt => "debt",
            Self::Bureaucracy => "bureaucracy",
            Self::Person => "person",
            Self::Organization => "organization",
            Self::Custom(tag) => tag,
        }
    }

    /// Parse from label (case-insensitive); anything unrecognized becomes `Custom`.
    pub fn from_label(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "task" => Self::Task,
            "debt" => Self::Debt,
            "bureaucracy" => Self::Bureaucracy,
            "person" => Self::Person,
            "organization" => Self::Organization,
            _ => Self::Custom(s.to_string()),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl From<String> for EntityKind {
    fn from(s: String) -> Self {
        Self::from_label(&s)
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        kind.as_label().to_string()
    }
}

/// A typed record in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub properties: Properties,
    /// Set by the graph on every upsert.
    pub created_at: DateTime<Utc>,
}

impl Entity {
    /// Create an entity with no properties.
    pub fn new(id: impl Into<EntityId>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            kind,
            properties: Properties::new(),
            created_at: Utc::now(),
        }
    }

    /// Create an entity with the given property map.
    pub fn with_properties(id: impl Into<EntityId>, kind: EntityKind, properties: Properties) -> Self {
        Self {
            properties,
            ..Self::new(id, kind)
        }
    }

    /// Builder-style property setter.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Raw property value.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// String property; empty strings count as absent.
    pub fn str_prop(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Numeric property. Numeric strings ("42.5") are accepted as well.
    pub fn num_prop(&self, key: &str) -> Option<f64> {
        match self.properties.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// The `deadline` property as a UTC instant, if present and parseable.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.str_prop("deadline").and_then(parse_timestamp)
    }

    /// Human-facing label: `title`, then `subject`, then the id.
    pub fn display_name(&self) -> &str {
        self.str_prop("title")
            .or_else(|| self.str_prop("subject"))
            .unwrap_or(self.id.as_str())
    }

    /// Serialized property text used for keyword search.
    pub fn searchable_text(&self) -> String {
        Value::Object(self.properties.clone()).to_string()
    }
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (read as UTC midnight).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
