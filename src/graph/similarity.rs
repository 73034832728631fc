//! Task-to-task similarity.
//!
//! `score = 0.4·[category equal] + 0.3·[priority equal] + 0.3·[entity equal]`.
//! Two absent values compare equal.

use serde::Serialize;

use super::index::KnowledgeGraph;
use crate::entity::{Entity, EntityKind};

pub const CATEGORY_WEIGHT: f64 = 0.4;
pub const PRIORITY_WEIGHT: f64 = 0.3;
pub const ENTITY_WEIGHT: f64 = 0.3;

/// A task scored against the query task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarTask {
    pub task: Entity,
    pub similarity: f64,
}

/// Weighted indicator score in [0, 1].
pub fn task_similarity(a: &Entity, b: &Entity) -> f64 {
    let mut score = 0.0;
    if a.property("category") == b.property("category") {
        score += CATEGORY_WEIGHT;
    }
    if a.property("priority") == b.property("priority") {
        score += PRIORITY_WEIGHT;
    }
    if a.property("entity") == b.property("entity") {
        score += ENTITY_WEIGHT;
    }
    score
}

impl KnowledgeGraph {
    /// Other tasks scoring strictly above `threshold` against `task_id`,
    /// best first; ties keep encounter order. Unknown ids yield nothing.
    pub fn find_similar(&self, task_id: &str, threshold: f64) -> Vec<SimilarTask> {
        let Some(task) = self.entity(task_id) else {
            return Vec::new();
        };
        let mut similar: Vec<SimilarTask> = self
            .entities_of_kind(&EntityKind::Task)
            .filter(|other| other.id != task.id)
            .filter_map(|other| {
                let similarity = task_similarity(task, other);
                (similarity > threshold).then(|| SimilarTask {
                    task: other.clone(),
                    similarity,
                })
            })
            .collect();
        similar.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        similar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SIMILARITY_THRESHOLD;

    fn task(id: &str, category: &str, priority: &str, entity: &str) -> Entity {
        Entity::new(id, EntityKind::Task)
            .with_property("category", category)
            .with_property("priority", priority)
            .with_property("entity", entity)
    }

    #[test]
    fn identical_and_disjoint_tasks() {
        let a = task("a", "finance", "high", "Bank");
        let b = task("b", "finance", "high", "Bank");
        let c = task("c", "health", "low", "Doctor");
        assert!((task_similarity(&a, &b) - 1.0).abs() < 1e-9);
        assert_eq!(task_similarity(&a, &c), 0.0);
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut kg = KnowledgeGraph::new();
        kg.add_entity(task("a", "finance", "high", "Bank"));
        kg.add_entity(task("priority-only", "health", "high", "Doctor"));
        kg.add_entity(task("category-only", "finance", "low", "Doctor"));

        let similar = kg.find_similar("a", DEFAULT_SIMILARITY_THRESHOLD);
        let ids: Vec<&str> = similar.iter().map(|s| s.task.id.as_str()).collect();
        // 0.3 is not above 0.3; 0.4 is.
        assert_eq!(ids, vec!["category-only"]);
        assert!((similar[0].similarity - 0.4).abs() < 1e-9);
    }

    #[test]
    fn sorted_descending_with_stable_ties() {
        let mut kg = KnowledgeGraph::new();
        kg.add_entity(task("a", "finance", "high", "Bank"));
        kg.add_entity(task("x", "finance", "low", "Other"));
        kg.add_entity(task("y", "finance", "high", "Bank"));
        kg.add_entity(task("z", "finance", "low", "Else"));
        kg.add_entity(Entity::new("d1", EntityKind::Debt).with_property("category", "finance"));

        let ids: Vec<String> = kg
            .find_similar("a", DEFAULT_SIMILARITY_THRESHOLD)
            .into_iter()
            .map(|s| s.task.id.to_string())
            .collect();
        assert_eq!(ids, vec!["y", "x", "z"]);
    }

    #[test]
    fn unknown_task_yields_nothing() {
        let kg = KnowledgeGraph::new();
        assert!(kg.find_similar("missing", 0.0).is_empty());
    }

    #[test]
    fn missing_attributes_compare_equal() {
        let a = Entity::new("a", EntityKind::Task);
        let b = Entity::new("b", EntityKind::Task);
        assert!((task_similarity(&a, &b) - 1.0).abs() < 1e-9);
    }
}
