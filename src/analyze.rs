//! Pattern analysis over a knowledge-graph snapshot.
//!
//! The analyzer is a read-only pass: it borrows the graph immutably and
//! returns owned [`Pattern`]s, so the graph can be written again as soon as
//! analysis returns. Detectors run in a fixed order and each one emits its
//! findings in entity encounter order, which keeps the output deterministic.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::config::HeuristicConfig;
use crate::entity::{Entity, EntityId, EntityKind};
use crate::graph::index::KnowledgeGraph;
use crate::graph::{Direction, RelatedEntity, RelationKind};

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Fractional days from `from` to `to` (negative when `to` is earlier).
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_DAY
}

// ---------------------------------------------------------------------------
// Pattern types
// ---------------------------------------------------------------------------

/// Several debts owed to the same creditor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsolidationOpportunity {
    /// Creditor or company name shared by the members.
    pub group_key: String,
    pub members: Vec<Entity>,
    /// Sum of member amounts; missing amounts count as zero.
    pub total_amount: f64,
}

/// A task together with its dependency-typed neighbours.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyChain {
    pub task: Entity,
    pub depends_on: Vec<RelatedEntity>,
    pub blocks: Vec<RelatedEntity>,
    pub related_to: Vec<RelatedEntity>,
}

impl DependencyChain {
    /// Neighbours with a `blocks` edge pointing at the task.
    pub fn blockers(&self) -> impl Iterator<Item = &RelatedEntity> {
        self.blocks.iter().filter(|r| r.direction == Direction::Incoming)
    }
}

/// An item whose deadline could be parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeadlineItem {
    pub entity: Entity,
    pub deadline: DateTime<Utc>,
}

/// Consecutive deadlines no further apart than the configured gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeadlineCluster {
    /// At least two items, ascending by deadline.
    pub items: Vec<DeadlineItem>,
}

/// A debt small enough to pay off right away.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmallDebt {
    pub debt: Entity,
    pub amount: f64,
}

/// Several bureaucratic items handled by the same authority.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BureaucracyBatch {
    pub authority: String,
    pub items: Vec<Entity>,
}

/// A bureaucratic item whose deadline falls inside the preparation window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApproachingDeadline {
    pub item: Entity,
    pub deadline: DateTime<Utc>,
    pub days_until: f64,
}

/// A pending bureaucracy task that other pending tasks may be waiting on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PotentialBlocker {
    pub task: Entity,
    pub waiting: Vec<Entity>,
}

/// A structural finding derived from the current snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "pattern", rename_all = "snake_case")]
pub enum Pattern {
    ConsolidationOpportunity(ConsolidationOpportunity),
    SmallDebt(SmallDebt),
    BureaucracyBatch(BureaucracyBatch),
    ApproachingDeadline(ApproachingDeadline),
    PotentialBlocker(PotentialBlocker),
    DependencyChain(DependencyChain),
    DeadlineCluster(DeadlineCluster),
}

/// Summary statistics over positive debt amounts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebtProfile {
    pub count: usize,
    pub total: f64,
    pub average: f64,
    /// Upper median (`sorted[len / 2]`).
    pub median: f64,
    /// Amounts below 100.
    pub low: usize,
    /// Amounts in [100, 500).
    pub medium: usize,
    /// Amounts of 500 and above.
    pub high: usize,
}

impl DebtProfile {
    /// Profile of the positive amounts in `amounts`, or `None` if there are none.
    pub fn from_amounts(amounts: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut sorted: Vec<f64> = amounts.into_iter().filter(|a| *a > 0.0).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);
        let total: f64 = sorted.iter().sum();
        Some(Self {
            count: sorted.len(),
            total,
            average: total / sorted.len() as f64,
            median: sorted[sorted.len() / 2],
            low: sorted.iter().filter(|a| **a < 100.0).count(),
            medium: sorted.iter().filter(|a| (100.0..500.0).contains(*a)).count(),
            high: sorted.iter().filter(|a| **a >= 500.0).count(),
        })
    }
}

/// Why two records look connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    SameEntity,
    SimilarAmount,
    SameCase,
}

impl ConnectionKind {
    pub fn strength(self) -> f64 {
        match self {
            Self::SameEntity => 0.9,
            Self::SimilarAmount => 0.7,
            Self::SameCase => 0.95,
        }
    }
}

/// An undirected link between two records inferred from shared attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    pub first: EntityId,
    pub second: EntityId,
    pub kind: ConnectionKind,
    pub strength: f64,
    pub note: String,
}

/// Coarse category of a bureaucratic process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessType {
    Marriage,
    Tax,
    Employment,
    Insurance,
    General,
}

/// Authority fragments and subject keywords per process type, checked in order.
const PROCESS_RULES: [(ProcessType, &str, &[&str]); 4] = [
    (ProcessType::Marriage, "standesamt", &["marriage", "wedding", "heirat", "hochzeit"]),
    (ProcessType::Tax, "finanzamt", &["tax", "steuer"]),
    (ProcessType::Employment, "jobcenter", &["employment", "arbeitslos", "bewerbung"]),
    (ProcessType::Insurance, "krankenkasse", &["insurance", "versicherung"]),
];

impl ProcessType {
    /// Categorize by lowercased `entity`, then by `subject` keywords.
    pub fn of(item: &Entity) -> Self {
        let authority = item.str_prop("entity").unwrap_or_default().to_lowercase();
        let subject = item.str_prop("subject").unwrap_or_default().to_lowercase();
        PROCESS_RULES
            .iter()
            .find(|(_, fragment, keywords)| {
                authority.contains(fragment) || keywords.iter().any(|k| subject.contains(k))
            })
            .map_or(Self::General, |(kind, _, _)| *kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskKind {
    DebtEscalation,
    DeadlineMiss,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskItem {
    pub kind: RiskKind,
    pub description: String,
    pub mitigation: String,
    pub related_entities: Vec<EntityId>,
}

/// Risks bucketed by severity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub high: Vec<RiskItem>,
    pub medium: Vec<RiskItem>,
    pub low: Vec<RiskItem>,
}

impl RiskAssessment {
    pub fn is_empty(&self) -> bool {
        self.high.is_empty() && self.medium.is_empty() && self.low.is_empty()
    }
}

/// Everything one analysis pass found.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatternReport {
    pub analyzed_at: Option<DateTime<Utc>>,
    /// Number of task, debt and bureaucracy entities inspected.
    pub analyzed_records: usize,
    pub patterns: Vec<Pattern>,
    pub debt_profile: Option<DebtProfile>,
    /// Informational only; connections never become suggestions.
    pub connections: Vec<Connection>,
    /// Bureaucratic items per process type, in first-encounter order.
    pub process_types: IndexMap<ProcessType, Vec<EntityId>>,
    pub risks: RiskAssessment,
}

impl PatternReport {
    pub fn consolidation_opportunities(&self) -> impl Iterator<Item = &ConsolidationOpportunity> {
        self.patterns.iter().filter_map(|p| match p {
            Pattern::ConsolidationOpportunity(c) => Some(c),
            _ => None,
        })
    }

    pub fn dependency_chains(&self) -> impl Iterator<Item = &DependencyChain> {
        self.patterns.iter().filter_map(|p| match p {
            Pattern::DependencyChain(c) => Some(c),
            _ => None,
        })
    }

    pub fn deadline_clusters(&self) -> impl Iterator<Item = &DeadlineCluster> {
        self.patterns.iter().filter_map(|p| match p {
            Pattern::DeadlineCluster(c) => Some(c),
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Runs every detector over a graph snapshot.
#[derive(Debug, Clone, Copy)]
pub struct PatternAnalyzer<'a> {
    config: &'a HeuristicConfig,
}

impl<'a> PatternAnalyzer<'a> {
    pub fn new(config: &'a HeuristicConfig) -> Self {
        Self { config }
    }

    /// Analyze the whole graph as of `now`.
    pub fn analyze(&self, graph: &KnowledgeGraph, now: DateTime<Utc>) -> PatternReport {
        let debts: Vec<&Entity> = graph.entities_of_kind(&EntityKind::Debt).collect();
        let tasks: Vec<&Entity> = graph.entities_of_kind(&EntityKind::Task).collect();
        let bureaucracy: Vec<&Entity> = graph.entities_of_kind(&EntityKind::Bureaucracy).collect();

        let mut patterns = Vec::new();
        patterns.extend(
            self.consolidation_opportunities(&debts)
                .into_iter()
                .map(Pattern::ConsolidationOpportunity),
        );
        patterns.extend(self.small_debts(&debts).into_iter().map(Pattern::SmallDebt));
        patterns.extend(
            self.bureaucracy_batches(&bureaucracy)
                .into_iter()
                .map(Pattern::BureaucracyBatch),
        );
        patterns.extend(
            self.approaching_deadlines(&bureaucracy, now)
                .into_iter()
                .map(Pattern::ApproachingDeadline),
        );
        patterns.extend(
            self.potential_blockers(&tasks)
                .into_iter()
                .map(Pattern::PotentialBlocker),
        );
        patterns.extend(
            self.dependency_chains(graph, &tasks)
                .into_iter()
                .map(Pattern::DependencyChain),
        );
        let deadline_items: Vec<&Entity> = tasks.iter().chain(bureaucracy.iter()).copied().collect();
        patterns.extend(
            self.deadline_clusters(&deadline_items)
                .into_iter()
                .map(Pattern::DeadlineCluster),
        );

        let records: Vec<&Entity> = tasks
            .iter()
            .chain(debts.iter())
            .chain(bureaucracy.iter())
            .copied()
            .collect();
        let report = PatternReport {
            analyzed_at: Some(now),
            analyzed_records: records.len(),
            debt_profile: DebtProfile::from_amounts(debts.iter().filter_map(|d| d.num_prop("amount"))),
            connections: self.connections(&records),
            process_types: self.process_types(&bureaucracy),
            risks: self.assess_risks(&patterns, &deadline_items, now),
            patterns,
        };
        tracing::info!(
            records = report.analyzed_records,
            patterns = report.patterns.len(),
            connections = report.connections.len(),
            high_risks = report.risks.high.len(),
            "pattern analysis complete"
        );
        report
    }

    /// Group debts by `creditor_name` (else `company`); groups of two or more.
    pub fn consolidation_opportunities(&self, debts: &[&Entity]) -> Vec<ConsolidationOpportunity> {
        let mut groups: IndexMap<&str, Vec<&Entity>> = IndexMap::new();
        for debt in debts {
            if let Some(creditor) = creditor_of(debt) {
                groups.entry(creditor).or_default().push(*debt);
            }
        }
        groups
            .into_iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|(creditor, members)| ConsolidationOpportunity {
                group_key: creditor.to_string(),
                total_amount: members.iter().map(|d| d.num_prop("amount").unwrap_or(0.0)).sum(),
                members: members.into_iter().cloned().collect(),
            })
            .collect()
    }

    /// Debts with a positive amount below the small-debt threshold.
    pub fn small_debts(&self, debts: &[&Entity]) -> Vec<SmallDebt> {
        debts
            .iter()
            .filter_map(|debt| {
                let amount = debt.num_prop("amount")?;
                (amount > 0.0 && amount < self.config.small_debt_threshold).then(|| SmallDebt {
                    debt: (*debt).clone(),
                    amount,
                })
            })
            .collect()
    }

    /// Bureaucratic items grouped by their `entity` (authority); groups of two or more.
    pub fn bureaucracy_batches(&self, items: &[&Entity]) -> Vec<BureaucracyBatch> {
        let mut groups: IndexMap<&str, Vec<&Entity>> = IndexMap::new();
        for item in items {
            if let Some(authority) = item.str_prop("entity") {
                groups.entry(authority).or_default().push(*item);
            }
        }
        groups
            .into_iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|(authority, members)| BureaucracyBatch {
                authority: authority.to_string(),
                items: members.into_iter().cloned().collect(),
            })
            .collect()
    }

    /// Bureaucratic items due strictly inside the preparation window.
    pub fn approaching_deadlines(&self, items: &[&Entity], now: DateTime<Utc>) -> Vec<ApproachingDeadline> {
        items
            .iter()
            .filter_map(|item| {
                let deadline = item.deadline()?;
                let days_until = days_between(now, deadline);
                (days_until > self.config.approaching_min_days
                    && days_until < self.config.approaching_max_days)
                    .then(|| ApproachingDeadline {
                        item: (*item).clone(),
                        deadline,
                        days_until,
                    })
            })
            .collect()
    }

    /// Pending bureaucracy-category tasks with other pending tasks sharing
    /// their `entity` or `category`.
    ///
    /// A key is shared only when both tasks carry it with equal values; two
    /// tasks that both lack an `entity` are not grouped by it. Similarity
    /// scoring is looser and treats absent == absent as a match.
    pub fn potential_blockers(&self, tasks: &[&Entity]) -> Vec<PotentialBlocker> {
        tasks
            .iter()
            .filter(|t| t.str_prop("category") == Some("bureaucracy") && is_pending(t))
            .filter_map(|task| {
                let waiting: Vec<Entity> = tasks
                    .iter()
                    .filter(|other| other.id != task.id && is_pending(other))
                    .filter(|other| {
                        shares(task, other, "entity") || shares(task, other, "category")
                    })
                    .map(|other| (*other).clone())
                    .collect();
                (!waiting.is_empty()).then(|| PotentialBlocker {
                    task: (*task).clone(),
                    waiting,
                })
            })
            .collect()
    }

    /// Tasks with at least one `depends_on`, `blocks` or `related_to` neighbour.
    pub fn dependency_chains(&self, graph: &KnowledgeGraph, tasks: &[&Entity]) -> Vec<DependencyChain> {
        tasks
            .iter()
            .filter_map(|task| {
                let related = graph.find_related(task.id.as_str(), Some(&RelationKind::DEPENDENCY_KINDS[..]));
                if related.is_empty() {
                    return None;
                }
                let mut chain = DependencyChain {
                    task: (*task).clone(),
                    depends_on: Vec::new(),
                    blocks: Vec::new(),
                    related_to: Vec::new(),
                };
                for r in related {
                    match r.relationship.kind() {
                        RelationKind::DependsOn => chain.depends_on.push(r),
                        RelationKind::Blocks => chain.blocks.push(r),
                        _ => chain.related_to.push(r),
                    }
                }
                Some(chain)
            })
            .collect()
    }

    /// Single left-to-right greedy pass over items sorted by deadline.
    ///
    /// An item joins the current cluster when its gap to the cluster's last
    /// item is at most `cluster_gap_days`; otherwise the cluster is closed
    /// (kept only with two or more members) and a new one starts.
    pub fn deadline_clusters(&self, items: &[&Entity]) -> Vec<DeadlineCluster> {
        let mut dated: Vec<DeadlineItem> = items
            .iter()
            .filter_map(|e| {
                Some(DeadlineItem {
                    deadline: e.deadline()?,
                    entity: (*e).clone(),
                })
            })
            .collect();
        dated.sort_by_key(|item| item.deadline);

        let mut clusters = Vec::new();
        let mut current: Vec<DeadlineItem> = Vec::new();
        for item in dated {
            let joins = current
                .last()
                .is_none_or(|last| days_between(last.deadline, item.deadline) <= self.config.cluster_gap_days);
            if !joins {
                let closed = std::mem::take(&mut current);
                if closed.len() > 1 {
                    clusters.push(DeadlineCluster { items: closed });
                }
            }
            current.push(item);
        }
        if current.len() > 1 {
            clusters.push(DeadlineCluster { items: current });
        }
        clusters
    }

    /// Connection between `a` and `b`: shared `entity`, then amounts within
    /// the tolerance, then a shared `case_number`. First match wins.
    pub fn connection(&self, a: &Entity, b: &Entity) -> Option<Connection> {
        let link = |kind: ConnectionKind, note: String| Connection {
            first: a.id.clone(),
            second: b.id.clone(),
            kind,
            strength: kind.strength(),
            note,
        };
        if shares(a, b, "entity") {
            let authority = a.str_prop("entity").unwrap_or_default();
            return Some(link(
                ConnectionKind::SameEntity,
                format!("Both processes involve {authority}"),
            ));
        }
        let amount = |e: &Entity| e.num_prop("amount").filter(|v| *v != 0.0);
        if let (Some(x), Some(y)) = (amount(a), amount(b)) {
            if (x - y).abs() < self.config.similar_amount_tolerance {
                return Some(link(
                    ConnectionKind::SimilarAmount,
                    format!("Similar amounts: €{x} and €{y}"),
                ));
            }
        }
        if shares(a, b, "case_number") {
            let case = a.str_prop("case_number").unwrap_or_default();
            return Some(link(ConnectionKind::SameCase, format!("Same case number: {case}")));
        }
        None
    }

    /// Connections over every unordered pair of records, in encounter order.
    pub fn connections(&self, records: &[&Entity]) -> Vec<Connection> {
        let mut found = Vec::new();
        for (i, a) in records.iter().enumerate() {
            for b in &records[i + 1..] {
                if a.id == b.id {
                    continue;
                }
                found.extend(self.connection(a, b));
            }
        }
        found
    }

    /// Bureaucratic items grouped by [`ProcessType::of`].
    pub fn process_types(&self, items: &[&Entity]) -> IndexMap<ProcessType, Vec<EntityId>> {
        let mut groups: IndexMap<ProcessType, Vec<EntityId>> = IndexMap::new();
        for item in items {
            groups.entry(ProcessType::of(item)).or_default().push(item.id.clone());
        }
        groups
    }

    /// High: consolidation groups above the escalation amount. Medium: dated
    /// items due within the urgent window and not yet past.
    pub fn assess_risks(
        &self,
        patterns: &[Pattern],
        dated: &[&Entity],
        now: DateTime<Utc>,
    ) -> RiskAssessment {
        let mut risks = RiskAssessment::default();

        let escalating: Vec<&ConsolidationOpportunity> = patterns
            .iter()
            .filter_map(|p| match p {
                Pattern::ConsolidationOpportunity(c) if c.total_amount > self.config.escalation_amount => {
                    Some(c)
                }
                _ => None,
            })
            .collect();
        if !escalating.is_empty() {
            risks.high.push(RiskItem {
                kind: RiskKind::DebtEscalation,
                description: format!("{} urgent debt groups may escalate", escalating.len()),
                mitigation: "Contact creditors soon to negotiate a settlement".into(),
                related_entities: escalating
                    .iter()
                    .flat_map(|c| c.members.iter().map(|d| d.id.clone()))
                    .collect(),
            });
        }

        let urgent: Vec<EntityId> = dated
            .iter()
            .filter(|e| {
                e.deadline().is_some_and(|d| {
                    (0.0..=self.config.urgent_deadline_days).contains(&days_between(now, d))
                })
            })
            .map(|e| e.id.clone())
            .collect();
        if !urgent.is_empty() {
            risks.medium.push(RiskItem {
                kind: RiskKind::DeadlineMiss,
                description: format!("{} deadlines are close", urgent.len()),
                mitigation: "Prioritize tasks with deadlines".into(),
                related_entities: urgent,
            });
        }
        risks
    }
}

fn creditor_of(debt: &Entity) -> Option<&str> {
    debt.str_prop("creditor_name").or_else(|| debt.str_prop("company"))
}

fn is_pending(task: &Entity) -> bool {
    task.str_prop("status") == Some("pending")
}

fn shares(a: &Entity, b: &Entity, key: &str) -> bool {
    matches!((a.str_prop(key), b.str_prop(key)), (Some(x), Some(y)) if x == y)
}
