//! End-to-end tests for the lifegraph service.
//!
//! These exercise the full pipeline from record ingestion through pattern
//! analysis, suggestion templates and ranking, plus the query and progress
//! APIs that sit next to it.

use chrono::{DateTime, Duration, TimeZone, Utc};
use lifegraph::analyze::PatternAnalyzer;
use lifegraph::config::HeuristicConfig;
use lifegraph::entity::{Entity, EntityKind, Properties};
use lifegraph::graph::index::KnowledgeGraph;
use lifegraph::graph::{Direction, RelationKind};
use lifegraph::proactive::{AnalysisContext, ProactiveActions};
use lifegraph::progress::ProgressStatus;
use lifegraph::records::{BureaucracyRecord, DebtRecord, TaskRecord};
use lifegraph::suggest::{Priority, SuggestionKind};

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

fn in_days(days: i64) -> String {
    (fixed_now() + Duration::days(days)).to_rfc3339()
}

fn debt(id: &str, creditor: &str, amount: f64) -> DebtRecord {
    DebtRecord {
        id: id.into(),
        creditor_name: Some(creditor.into()),
        amount: Some(amount),
        ..Default::default()
    }
}

fn task(id: &str, deadline_days: i64) -> TaskRecord {
    TaskRecord {
        id: id.into(),
        title: Some(format!("Task {id}")),
        deadline: Some(in_days(deadline_days)),
        ..Default::default()
    }
}

#[test]
fn consolidation_only_for_repeated_creditor() {
    let mut service = ProactiveActions::default();
    let ctx = AnalysisContext::at(fixed_now());
    let out = service.analyze_and_suggest_actions(
        Vec::new(),
        vec![
            debt("d1", "X", 10.0),
            debt("d2", "X", 20.0),
            debt("d3", "X", 30.0),
            debt("d4", "Y", 500.0),
        ],
        Vec::new(),
        &ctx,
    );

    let consolidation: Vec<_> = out
        .iter()
        .filter(|s| s.id.starts_with("debt_consolidation_"))
        .collect();
    assert_eq!(consolidation.len(), 1);
    assert_eq!(consolidation[0].id, "debt_consolidation_X");
    assert_eq!(
        consolidation[0].description,
        "You have 3 separate debts with X totaling €60"
    );

    let report = service.analyze(&ctx);
    let opportunities: Vec<_> = report.consolidation_opportunities().collect();
    assert_eq!(opportunities.len(), 1);
    assert_eq!(opportunities[0].total_amount, 60.0);
}

#[test]
fn deadline_clusters_across_tasks_and_bureaucracy() {
    let mut service = ProactiveActions::default();
    let ctx = AnalysisContext::at(fixed_now());
    service.ingest(
        vec![task("t11", 11), task("t1", 1)],
        Vec::new(),
        vec![
            BureaucracyRecord {
                id: "b12".into(),
                deadline: Some(in_days(12)),
                ..Default::default()
            },
            BureaucracyRecord {
                id: "b3".into(),
                deadline: Some(in_days(3)),
                ..Default::default()
            },
        ],
    );

    let report = service.analyze(&ctx);
    let clusters: Vec<Vec<String>> = report
        .deadline_clusters()
        .map(|c| c.items.iter().map(|i| i.entity.id.to_string()).collect())
        .collect();
    assert_eq!(clusters, vec![vec!["t1", "b3"], vec!["t11", "b12"]]);

    let suggestions = service.suggest_actions(&ctx);
    let cluster_ids: Vec<&str> = suggestions
        .iter()
        .filter(|s| s.id.starts_with("deadline_cluster_"))
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(cluster_ids, vec!["deadline_cluster_t1", "deadline_cluster_t11"]);
}

#[test]
fn cluster_gap_follows_configuration() {
    let config = HeuristicConfig {
        cluster_gap_days: 2.0,
        ..Default::default()
    };
    let mut kg = KnowledgeGraph::new();
    for (id, days) in [("a", 1), ("b", 3), ("c", 6)] {
        kg.add_entity(Entity::new(id, EntityKind::Task).with_property("deadline", in_days(days)));
    }
    let report = PatternAnalyzer::new(&config).analyze(&kg, fixed_now());
    let clusters: Vec<usize> = report.deadline_clusters().map(|c| c.items.len()).collect();
    assert_eq!(clusters, vec![2]);
}

#[test]
fn ranking_puts_urgent_preventive_work_first() {
    let mut service = ProactiveActions::default();
    let ctx = AnalysisContext::at(fixed_now());
    let out = service.analyze_and_suggest_actions(
        vec![
            TaskRecord {
                id: "t1".into(),
                title: Some("Submit tax forms".into()),
                category: Some("bureaucracy".into()),
                status: Some("pending".into()),
                entity: Some("Finanzamt".into()),
                ..Default::default()
            },
            TaskRecord {
                id: "t2".into(),
                category: Some("finance".into()),
                status: Some("pending".into()),
                entity: Some("Finanzamt".into()),
                ..Default::default()
            },
        ],
        vec![debt("d1", "Gym", 25.0)],
        vec![BureaucracyRecord {
            id: "b1".into(),
            subject: Some("Passport renewal".into()),
            deadline: Some(in_days(12)),
            ..Default::default()
        }],
        &ctx,
    );

    let ids: Vec<&str> = out.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "resolve_blocker_t1",
            "prepare_deadline_b1",
            "early_payment_d1",
            "time_optimization",
            "energy_optimization",
        ]
    );
    assert_eq!(out[0].kind, SuggestionKind::Preventive);
    assert_eq!(out[0].priority, Priority::High);
    assert_eq!(out[1].description, "Passport renewal deadline is in 12 days");
    for pair in out.windows(2) {
        let a = (pair[0].priority.rank(), pair[0].kind.weight());
        let b = (pair[1].priority.rank(), pair[1].kind.weight());
        assert!(a >= b);
    }
}

#[test]
fn dependency_links_feed_suggestions_and_queries() {
    let mut service = ProactiveActions::default();
    let ctx = AnalysisContext::at(fixed_now());
    service.ingest(
        vec![task("t1", 60), task("t2", 90)],
        vec![debt("d1", "Bank", 800.0)],
        Vec::new(),
    );
    let graph = service.graph_mut();
    graph.add_relationship("t2", "t1", RelationKind::Blocks, Properties::new());
    graph.link_task_to_debt("t1", "d1", None);
    graph.add_relationship("t1", "ghost", RelationKind::DependsOn, Properties::new());

    let related = service.graph().find_related("t1", None);
    assert_eq!(related.len(), 2);
    assert_eq!(related[0].entity.id.as_str(), "t2");
    assert_eq!(related[0].direction, Direction::Incoming);
    assert_eq!(related[1].entity.id.as_str(), "d1");
    assert_eq!(related[1].direction, Direction::Outgoing);

    let suggestions = service.suggest_actions(&ctx);
    let dep = suggestions
        .iter()
        .find(|s| s.id == "resolve_dependencies_t1")
        .unwrap();
    assert_eq!(dep.actions, vec!["Complete: Task t2"]);
    assert_eq!(dep.deadline, fixed_now() + Duration::days(60));

    let hits = service.search("debt management");
    assert!(!hits.is_empty());
}

#[test]
fn shared_authority_batches_bureaucracy() {
    let mut service = ProactiveActions::default();
    let ctx = AnalysisContext::at(fixed_now());
    let office = |id: &str, entity: &str, subject: &str| BureaucracyRecord {
        id: id.into(),
        entity: Some(entity.into()),
        subject: Some(subject.into()),
        ..Default::default()
    };
    let out = service.analyze_and_suggest_actions(
        Vec::new(),
        Vec::new(),
        vec![
            office("b1", "Finanzamt", "Tax return"),
            office("b2", "Standesamt", "Marriage certificate"),
            office("b3", "Finanzamt", "Property tax"),
        ],
        &ctx,
    );

    let batches: Vec<_> = out
        .iter()
        .filter(|s| s.id.starts_with("batch_bureaucracy_"))
        .collect();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].id, "batch_bureaucracy_Finanzamt");
    assert_eq!(batches[0].kind, SuggestionKind::Optimization);
    assert_eq!(batches[0].priority, Priority::Medium);
    assert_eq!(batches[0].deadline, fixed_now() + Duration::days(14));
    assert_eq!(batches[0].related_entities.len(), 2);

    let report = service.analyze(&ctx);
    assert_eq!(report.process_types.len(), 2);
    assert_eq!(report.connections.len(), 1);
    assert_eq!(report.connections[0].first.as_str(), "b1");
    assert_eq!(report.connections[0].second.as_str(), "b3");
}

#[test]
fn large_debt_load_adds_planning_and_legal_aid() {
    let mut service = ProactiveActions::default();
    let ctx = AnalysisContext::at(fixed_now());
    let out = service.analyze_and_suggest_actions(
        Vec::new(),
        vec![debt("d1", "Bank", 3500.0), debt("d2", "Bank", 2500.0)],
        Vec::new(),
        &ctx,
    );
    let ids: Vec<&str> = out.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "financial_planning",
            "debt_consolidation_Bank",
            "time_optimization",
            "energy_optimization",
            "legal_aid",
        ]
    );

    let report = service.analyze(&ctx);
    assert_eq!(report.risks.high.len(), 1);
}

#[test]
fn progress_lifecycle_through_service() {
    let mut service = ProactiveActions::default();
    assert_eq!(service.track_progress("a", 0.0).status, ProgressStatus::Pending);
    assert_eq!(service.track_progress("a", 45.0).status, ProgressStatus::InProgress);
    let done = service.track_progress("a", 150.0);
    assert_eq!(done.status, ProgressStatus::Completed);
    assert_eq!(done.progress, 100);
    assert!(done.completed_at.is_some());
}

#[test]
fn similarity_threshold_excludes_priority_only_match() {
    let mut service = ProactiveActions::default();
    let t = |id: &str, category: &str, priority: &str, entity: &str| TaskRecord {
        id: id.into(),
        category: Some(category.into()),
        priority: Some(priority.into()),
        entity: Some(entity.into()),
        ..Default::default()
    };
    service.ingest(
        vec![
            t("base", "finance", "high", "Bank"),
            t("twin", "finance", "high", "Bank"),
            t("stranger", "health", "low", "Doctor"),
            t("same-priority", "health", "high", "Doctor"),
        ],
        Vec::new(),
        Vec::new(),
    );

    let similar = service.find_similar("base");
    assert_eq!(similar.len(), 1);
    assert_eq!(similar[0].task.id.as_str(), "twin");
    assert!((similar[0].similarity - 1.0).abs() < 1e-9);
}

#[test]
fn empty_input_is_not_an_error() {
    let mut service = ProactiveActions::default();
    let out = service.analyze_and_suggest_actions(
        Vec::new(),
        Vec::new(),
        Vec::new(),
        &AnalysisContext::at(fixed_now()),
    );
    assert!(out.is_empty());
    assert!(service.search("anything").is_empty());
    assert!(service.find_similar("missing").is_empty());
}
