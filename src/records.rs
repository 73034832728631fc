//! Input records supplied by ingestion collaborators.
//!
//! Records are flat maps with at least an `id`. Known fields are typed; any
//! other field is kept in `extra` and lands in the entity's properties
//! unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{Entity, EntityKind, Properties};

/// A to-do item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(flatten)]
    pub extra: Properties,
}

/// An outstanding debt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebtRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creditor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(flatten)]
    pub extra: Properties,
}

/// A bureaucratic process (form, appointment, filing).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BureaucracyRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// The authority or office handling the process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(flatten)]
    pub extra: Properties,
}

fn put_str(props: &mut Properties, key: &str, value: Option<String>) {
    if let Some(v) = value {
        props.insert(key.to_string(), Value::String(v));
    }
}

fn finish(mut props: Properties, id: &str, extra: Properties) -> Properties {
    props.insert("id".to_string(), Value::String(id.to_string()));
    for (k, v) in extra {
        props.entry(k).or_insert(v);
    }
    props
}

impl From<TaskRecord> for Entity {
    fn from(r: TaskRecord) -> Self {
        let mut props = Properties::new();
        put_str(&mut props, "title", r.title);
        put_str(&mut props, "subject", r.subject);
        put_str(&mut props, "category", r.category);
        put_str(&mut props, "priority", r.priority);
        put_str(&mut props, "entity", r.entity);
        put_str(&mut props, "status", r.status);
        put_str(&mut props, "deadline", r.deadline);
        let props = finish(props, &r.id, r.extra);
        Entity::with_properties(r.id, EntityKind::Task, props)
    }
}

impl From<DebtRecord> for Entity {
    fn from(r: DebtRecord) -> Self {
        let mut props = Properties::new();
        put_str(&mut props, "creditor_name", r.creditor_name);
        put_str(&mut props, "company", r.company);
        if let Some(amount) = r.amount.and_then(serde_json::Number::from_f64) {
            props.insert("amount".to_string(), Value::Number(amount));
        }
        put_str(&mut props, "status", r.status);
        put_str(&mut props, "deadline", r.deadline);
        let props = finish(props, &r.id, r.extra);
        Entity::with_properties(r.id, EntityKind::Debt, props)
    }
}

impl From<BureaucracyRecord> for Entity {
    fn from(r: BureaucracyRecord) -> Self {
        let mut props = Properties::new();
        put_str(&mut props, "subject", r.subject);
        put_str(&mut props, "entity", r.entity);
        put_str(&mut props, "status", r.status);
        put_str(&mut props, "deadline", r.deadline);
        let props = finish(props, &r.id, r.extra);
        Entity::with_properties(r.id, EntityKind::Bureaucracy, props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_record_keeps_unknown_fields() {
        let record: TaskRecord = serde_json::from_value(json!({
            "id": "t1",
            "title": "File taxes",
            "category": "bureaucracy",
            "estimated_hours": 3
        }))
        .unwrap();
        assert_eq!(record.extra.get("estimated_hours"), Some(&json!(3)));

        let entity = Entity::from(record);
        assert_eq!(entity.kind, EntityKind::Task);
        assert_eq!(entity.id.as_str(), "t1");
        assert_eq!(entity.str_prop("category"), Some("bureaucracy"));
        assert_eq!(entity.num_prop("estimated_hours"), Some(3.0));
        assert_eq!(entity.str_prop("id"), Some("t1"));
    }

    #[test]
    fn debt_amount_becomes_number() {
        let entity = Entity::from(DebtRecord {
            id: "d1".into(),
            company: Some("Telekom".into()),
            amount: Some(59.9),
            ..Default::default()
        });
        assert_eq!(entity.kind, EntityKind::Debt);
        assert_eq!(entity.num_prop("amount"), Some(59.9));
        assert_eq!(entity.str_prop("creditor_name"), None);
    }

    #[test]
    fn bureaucracy_record_maps_entity_field() {
        let entity = Entity::from(BureaucracyRecord {
            id: "b1".into(),
            subject: Some("Residence permit".into()),
            entity: Some("Ausländerbehörde".into()),
            deadline: Some("2025-06-30".into()),
            ..Default::default()
        });
        assert_eq!(entity.kind, EntityKind::Bureaucracy);
        assert_eq!(entity.str_prop("entity"), Some("Ausländerbehörde"));
        assert!(entity.deadline().is_some());
    }
}
