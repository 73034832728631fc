//! The proactive-actions service: ingest records, analyze, suggest, rank.
//!
//! [`ProactiveActions`] owns one knowledge graph, one progress tracker and the
//! heuristic configuration. There is no global instance; callers construct as
//! many independent services as they need.

use chrono::{DateTime, Utc};

use crate::analyze::{PatternAnalyzer, PatternReport};
use crate::config::HeuristicConfig;
use crate::entity::Entity;
use crate::graph::index::{GraphConfig, GraphStats, KnowledgeGraph};
use crate::graph::search::SearchHit;
use crate::graph::similarity::SimilarTask;
use crate::prioritize::prioritized;
use crate::progress::{ActionProgress, ProgressTracker};
use crate::records::{BureaucracyRecord, DebtRecord, TaskRecord};
use crate::suggest::{Suggestion, SuggestionEngine};

/// Per-call analysis inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisContext {
    /// Reference time for deadline windows and suggestion deadlines.
    pub now: DateTime<Utc>,
}

impl AnalysisContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self { now: Utc::now() }
    }
}

/// Knowledge graph plus analysis pipeline plus progress state.
pub struct ProactiveActions {
    graph: KnowledgeGraph,
    progress: ProgressTracker,
    config: HeuristicConfig,
}

impl ProactiveActions {
    /// Service over a fresh in-memory graph.
    pub fn new(config: HeuristicConfig) -> Self {
        Self::with_graph(KnowledgeGraph::new(), config)
    }

    /// Service over an existing graph.
    pub fn with_graph(graph: KnowledgeGraph, config: HeuristicConfig) -> Self {
        Self {
            graph,
            progress: ProgressTracker::new(),
            config,
        }
    }

    /// Service over a graph opened from `graph_config` (durable if a data
    /// directory is set, falling back to memory).
    pub fn open(graph_config: &GraphConfig, config: HeuristicConfig) -> Self {
        Self::with_graph(KnowledgeGraph::open(graph_config), config)
    }

    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }

    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut KnowledgeGraph {
        &mut self.graph
    }

    /// Upsert records into the graph as task, debt and bureaucracy entities.
    /// Returns the number of records written.
    pub fn ingest(
        &mut self,
        tasks: impl IntoIterator<Item = TaskRecord>,
        debts: impl IntoIterator<Item = DebtRecord>,
        bureaucracy: impl IntoIterator<Item = BureaucracyRecord>,
    ) -> usize {
        let mut written = 0;
        for entity in tasks
            .into_iter()
            .map(Entity::from)
            .chain(debts.into_iter().map(Entity::from))
            .chain(bureaucracy.into_iter().map(Entity::from))
        {
            self.graph.add_entity(entity);
            written += 1;
        }
        written
    }

    /// Ingest the given records, analyze the graph and return ranked
    /// suggestions. Empty input yields an empty list.
    pub fn analyze_and_suggest_actions(
        &mut self,
        tasks: Vec<TaskRecord>,
        debts: Vec<DebtRecord>,
        bureaucracy: Vec<BureaucracyRecord>,
        ctx: &AnalysisContext,
    ) -> Vec<Suggestion> {
        if tasks.is_empty() && debts.is_empty() && bureaucracy.is_empty() {
            tracing::debug!("no records supplied, nothing to analyze");
            return Vec::new();
        }
        let ingested = self.ingest(tasks, debts, bureaucracy);
        let suggestions = self.suggest_actions(ctx);
        tracing::info!(
            ingested,
            entities = self.graph.entity_count(),
            suggestions = suggestions.len(),
            "proactive analysis complete"
        );
        suggestions
    }

    /// Run the detectors over the current graph.
    pub fn analyze(&self, ctx: &AnalysisContext) -> PatternReport {
        PatternAnalyzer::new(&self.config).analyze(&self.graph, ctx.now)
    }

    /// Ranked suggestions for the current graph, without ingesting anything.
    pub fn suggest_actions(&self, ctx: &AnalysisContext) -> Vec<Suggestion> {
        let report = self.analyze(ctx);
        let suggestions = SuggestionEngine::new(&self.config).suggest(&report, ctx.now);
        prioritized(suggestions)
    }

    /// Record progress on a suggested action.
    pub fn track_progress(&mut self, action_id: impl Into<String>, progress: f64) -> &ActionProgress {
        self.progress.track_progress(action_id, progress)
    }

    pub fn action_status(&self, action_id: &str) -> Option<&ActionProgress> {
        self.progress.status(action_id)
    }

    pub fn all_actions(&self) -> impl Iterator<Item = &ActionProgress> {
        self.progress.all()
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Tasks similar to `task_id` above the configured threshold.
    pub fn find_similar(&self, task_id: &str) -> Vec<SimilarTask> {
        self.graph.find_similar(task_id, self.config.similarity_threshold)
    }

    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        self.graph.search(query)
    }

    pub fn stats(&self) -> GraphStats {
        self.graph.stats()
    }
}

impl Default for ProactiveActions {
    fn default() -> Self {
        Self::new(HeuristicConfig::default())
    }
}
