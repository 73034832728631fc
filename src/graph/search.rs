//! Keyword search over entity properties and relationships.
//!
//! The query is lowercased and split on whitespace. A record matches when at
//! least one token occurs as a substring of its serialized text; its relevance
//! is the fraction of tokens found.

use serde::Serialize;

use super::Relationship;
use super::index::KnowledgeGraph;
use crate::entity::Entity;

/// What a search hit points at.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchTarget {
    Entity { entity: Entity },
    Relationship { relationship: Relationship },
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub target: SearchTarget,
    /// Matched tokens over query tokens, in (0, 1].
    pub relevance: f64,
}

/// Fraction of `tokens` contained in `text`. Both must already be lowercase.
pub fn relevance(tokens: &[String], text: &str) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    let matched = tokens.iter().filter(|t| text.contains(t.as_str())).count();
    matched as f64 / tokens.len() as f64
}

fn tokenize(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

impl KnowledgeGraph {
    /// Search entities, then relationships, ranked by relevance (stable on ties).
    ///
    /// An empty or whitespace-only query yields no results.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return Vec::new();
        }

        let entity_hits = self.entities().filter_map(|entity| {
            let score = relevance(&tokens, &entity.searchable_text().to_lowercase());
            (score > 0.0).then(|| SearchHit {
                target: SearchTarget::Entity {
                    entity: entity.clone(),
                },
                relevance: score,
            })
        });
        let relationship_hits = self.relationships().filter_map(|rel| {
            let score = relevance(&tokens, &rel.searchable_text().to_lowercase());
            (score > 0.0).then(|| SearchHit {
                target: SearchTarget::Relationship {
                    relationship: rel.clone(),
                },
                relevance: score,
            })
        });

        let mut hits: Vec<SearchHit> = entity_hits.chain(relationship_hits).collect();
        hits.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
        hits
    }
}
