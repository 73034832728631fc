//! Suggestion templates: one structured suggestion per detected pattern.
//!
//! Every text, action list and benefit list is fixed; only names, counts and
//! amounts are filled in from the pattern. Deadlines are `now` plus the
//! offset configured for the template.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::analyze::{
    ApproachingDeadline, BureaucracyBatch, ConsolidationOpportunity, DeadlineCluster,
    DependencyChain, Pattern, PatternReport, PotentialBlocker, SmallDebt,
};
use crate::config::HeuristicConfig;
use crate::entity::EntityId;

/// Broad category of a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Preventive,
    Opportunity,
    Optimization,
    Preparation,
}

impl SuggestionKind {
    /// Secondary ordering key: preventive work outranks preparation, which
    /// outranks optimization, which outranks opportunities.
    pub fn weight(self) -> u8 {
        match self {
            Self::Preventive => 4,
            Self::Preparation => 3,
            Self::Optimization => 2,
            Self::Opportunity => 1,
        }
    }
}

/// Primary ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Risk {
    None,
    Low,
    Medium,
    High,
}

/// A ranked, human-actionable recommendation. Regenerated on every analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub reasoning: String,
    pub actions: Vec<String>,
    pub expected_benefits: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_savings: Option<f64>,
    pub deadline: DateTime<Utc>,
    pub effort: Effort,
    pub risk: Risk,
    /// Entities the suggestion was derived from.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_entities: Vec<EntityId>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Maps analysis findings to suggestions.
#[derive(Debug, Clone, Copy)]
pub struct SuggestionEngine<'a> {
    config: &'a HeuristicConfig,
}

impl<'a> SuggestionEngine<'a> {
    pub fn new(config: &'a HeuristicConfig) -> Self {
        Self { config }
    }

    /// One suggestion per pattern, in report order, then the debt-total
    /// suggestions, then the two resource-optimization suggestions when any
    /// record was analyzed.
    pub fn suggest(&self, report: &PatternReport, now: DateTime<Utc>) -> Vec<Suggestion> {
        let mut suggestions: Vec<Suggestion> = report
            .patterns
            .iter()
            .filter_map(|pattern| self.from_pattern(pattern, now))
            .collect();
        if let Some(profile) = &report.debt_profile {
            suggestions.extend(self.from_debt_total(profile.total, now));
        }
        if report.analyzed_records > 0 {
            suggestions.push(self.time_optimization(now));
            suggestions.push(self.energy_optimization(now));
        }
        tracing::debug!(
            patterns = report.patterns.len(),
            suggestions = suggestions.len(),
            "generated suggestions"
        );
        suggestions
    }

    /// Suggestion for a single pattern. Dependency chains without blockers
    /// produce nothing.
    pub fn from_pattern(&self, pattern: &Pattern, now: DateTime<Utc>) -> Option<Suggestion> {
        match pattern {
            Pattern::ConsolidationOpportunity(p) => Some(self.consolidation(p, now)),
            Pattern::SmallDebt(p) => Some(self.small_debt(p, now)),
            Pattern::BureaucracyBatch(p) => Some(self.bureaucracy_batch(p, now)),
            Pattern::ApproachingDeadline(p) => Some(self.approaching_deadline(p, now)),
            Pattern::PotentialBlocker(p) => Some(self.potential_blocker(p, now)),
            Pattern::DependencyChain(p) => self.resolve_dependencies(p, now),
            Pattern::DeadlineCluster(p) => self.deadline_cluster(p, now),
        }
    }

    /// Financial planning and legal aid suggestions for a large debt total.
    pub fn from_debt_total(&self, total: f64, now: DateTime<Utc>) -> Vec<Suggestion> {
        let mut out = Vec::new();
        if total > self.config.financial_planning_threshold {
            out.push(self.financial_planning(total, now));
        }
        if total > self.config.legal_aid_threshold {
            out.push(self.legal_aid(now));
        }
        out
    }

    /// `now` plus `days`, or `now` itself when the offset overflows.
    fn due(&self, now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
        TimeDelta::try_days(days)
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or_else(|| {
                tracing::warn!(days, "deadline offset out of range, using now");
                now
            })
    }

    fn consolidation(&self, p: &ConsolidationOpportunity, now: DateTime<Utc>) -> Suggestion {
        let creditor = &p.group_key;
        Suggestion {
            id: format!("debt_consolidation_{creditor}"),
            kind: SuggestionKind::Optimization,
            priority: Priority::High,
            title: format!("Consolidate debts with {creditor}"),
            description: format!(
                "You have {} separate debts with {creditor} totaling €{}",
                p.members.len(),
                p.total_amount
            ),
            reasoning: "Consolidating multiple debts with the same creditor can simplify \
                        management and potentially reduce interest rates"
                .into(),
            actions: vec![
                format!("Contact {creditor} to discuss consolidation options"),
                "Prepare debt consolidation proposal".into(),
                "Calculate potential savings from consolidation".into(),
                "Negotiate better terms or payment plan".into(),
            ],
            expected_benefits: strings(&[
                "Simplified debt management",
                "Potential interest rate reduction",
                "Single monthly payment",
                "Improved credit score over time",
            ]),
            estimated_savings: Some(p.total_amount * self.config.consolidation_savings_rate),
            deadline: self.due(now, self.config.offsets.consolidation_days),
            effort: Effort::Medium,
            risk: Risk::Low,
            related_entities: p.members.iter().map(|d| d.id.clone()).collect(),
        }
    }

    fn small_debt(&self, p: &SmallDebt, now: DateTime<Utc>) -> Suggestion {
        let creditor = p
            .debt
            .str_prop("creditor_name")
            .or_else(|| p.debt.str_prop("company"))
            .unwrap_or("creditor");
        Suggestion {
            id: format!("early_payment_{}", p.debt.id),
            kind: SuggestionKind::Preventive,
            priority: Priority::Medium,
            title: format!("Pay off small debt: {creditor}"),
            description: format!("Quick win: Pay off €{} debt with {creditor}", p.amount),
            reasoning: "Small debts can be paid off quickly, reducing the number of creditors \
                        and improving cash flow"
                .into(),
            actions: vec![
                format!("Make payment of €{} to {creditor}", p.amount),
                "Request confirmation of debt closure".into(),
                "Update debt tracking system".into(),
            ],
            expected_benefits: strings(&[
                "Reduced number of active debts",
                "Improved cash flow",
                "Psychological boost from quick win",
            ]),
            estimated_savings: None,
            deadline: self.due(now, self.config.offsets.small_debt_days),
            effort: Effort::Low,
            risk: Risk::None,
            related_entities: vec![p.debt.id.clone()],
        }
    }

    fn bureaucracy_batch(&self, p: &BureaucracyBatch, now: DateTime<Utc>) -> Suggestion {
        let authority = &p.authority;
        let n = p.items.len();
        Suggestion {
            id: format!("batch_bureaucracy_{authority}"),
            kind: SuggestionKind::Optimization,
            priority: Priority::Medium,
            title: format!("Batch process {authority} tasks"),
            description: format!("Complete {n} tasks with {authority} in one visit"),
            reasoning: "Batch processing similar bureaucratic tasks saves time and reduces \
                        travel costs"
                .into(),
            actions: vec![
                format!("Prepare all required documents for {n} tasks"),
                format!("Schedule single appointment with {authority}"),
                "Complete all tasks in one visit".into(),
                "Follow up on all submissions together".into(),
            ],
            expected_benefits: strings(&[
                "Time savings (estimated 2-3 hours)",
                "Reduced travel costs",
                "More efficient process",
                "Better organization",
            ]),
            estimated_savings: None,
            deadline: self.due(now, self.config.offsets.bureaucracy_batch_days),
            effort: Effort::Medium,
            risk: Risk::Low,
            related_entities: p.items.iter().map(|e| e.id.clone()).collect(),
        }
    }

    fn approaching_deadline(&self, p: &ApproachingDeadline, now: DateTime<Utc>) -> Suggestion {
        let subject = p.item.display_name();
        Suggestion {
            id: format!("prepare_deadline_{}", p.item.id),
            kind: SuggestionKind::Preparation,
            priority: Priority::High,
            title: format!("Prepare for {subject} deadline"),
            description: format!("{subject} deadline is in {} days", p.days_until.round()),
            reasoning: "Early preparation prevents last-minute stress and ensures quality \
                        completion"
                .into(),
            actions: strings(&[
                "Gather all required documents",
                "Review requirements and procedures",
                "Schedule completion time",
                "Prepare backup plan if needed",
            ]),
            expected_benefits: strings(&[
                "Reduced stress",
                "Better quality work",
                "No last-minute rush",
                "Peace of mind",
            ]),
            estimated_savings: None,
            deadline: self.due(now, self.config.offsets.approaching_deadline_days),
            effort: Effort::Medium,
            risk: Risk::Low,
            related_entities: vec![p.item.id.clone()],
        }
    }

    fn potential_blocker(&self, p: &PotentialBlocker, now: DateTime<Utc>) -> Suggestion {
        let subject = p.task.display_name();
        Suggestion {
            id: format!("resolve_blocker_{}", p.task.id),
            kind: SuggestionKind::Preventive,
            priority: Priority::High,
            title: format!("Resolve blocking task: {subject}"),
            description: format!("{subject} might be blocking {} other tasks", p.waiting.len()),
            reasoning: "Completing blocking tasks first can unblock multiple dependent tasks".into(),
            actions: vec![
                format!("Complete: {subject}"),
                "Update task status".into(),
                "Check if other tasks are now unblocked".into(),
                "Prioritize newly unblocked tasks".into(),
            ],
            expected_benefits: strings(&[
                "Unblock dependent tasks",
                "Improve overall progress",
                "Reduce task backlog",
                "Better task flow",
            ]),
            estimated_savings: None,
            deadline: self.due(now, self.config.offsets.blocker_days),
            effort: Effort::High,
            risk: Risk::Medium,
            related_entities: std::iter::once(p.task.id.clone())
                .chain(p.waiting.iter().map(|t| t.id.clone()))
                .collect(),
        }
    }

    fn resolve_dependencies(&self, p: &DependencyChain, now: DateTime<Utc>) -> Option<Suggestion> {
        let blockers: Vec<_> = p.blockers().collect();
        if blockers.is_empty() {
            return None;
        }
        let title = p.task.display_name();
        Some(Suggestion {
            id: format!("resolve_dependencies_{}", p.task.id),
            kind: SuggestionKind::Preventive,
            priority: Priority::Medium,
            title: format!("Resolve blockers for: {title}"),
            description: format!("{title} is blocked by {} other tasks", blockers.len()),
            reasoning: "Blocking tasks must be completed before this task can progress".into(),
            actions: blockers
                .iter()
                .map(|b| format!("Complete: {}", b.entity.display_name()))
                .collect(),
            expected_benefits: strings(&["Unblock dependent tasks", "Keep the task on schedule"]),
            estimated_savings: None,
            deadline: p
                .task
                .deadline()
                .unwrap_or_else(|| self.due(now, self.config.offsets.dependency_fallback_days)),
            effort: Effort::Medium,
            risk: Risk::Low,
            related_entities: std::iter::once(p.task.id.clone())
                .chain(blockers.iter().map(|b| b.entity.id.clone()))
                .collect(),
        })
    }

    fn deadline_cluster(&self, p: &DeadlineCluster, now: DateTime<Utc>) -> Option<Suggestion> {
        let first = p.items.first()?;
        let n = p.items.len();
        Some(Suggestion {
            id: format!("deadline_cluster_{}", first.entity.id),
            kind: SuggestionKind::Preparation,
            priority: Priority::High,
            title: format!("Manage deadline cluster ({n} items)"),
            description: format!("{n} items have deadlines within a week of each other"),
            reasoning: "Clustered deadlines require careful planning to avoid last-minute stress"
                .into(),
            actions: strings(&[
                "Create detailed timeline for all items",
                "Prioritize items by importance and effort",
                "Allocate time blocks for each item",
                "Set intermediate milestones",
                "Prepare contingency plan",
            ]),
            expected_benefits: strings(&[
                "Better deadline management",
                "Reduced stress",
                "Higher quality completion",
                "No missed deadlines",
            ]),
            estimated_savings: None,
            deadline: self.due(now, self.config.offsets.deadline_cluster_days),
            effort: Effort::Medium,
            risk: Risk::Low,
            related_entities: p.items.iter().map(|i| i.entity.id.clone()).collect(),
        })
    }

    fn financial_planning(&self, total: f64, now: DateTime<Utc>) -> Suggestion {
        Suggestion {
            id: "financial_planning".into(),
            kind: SuggestionKind::Preventive,
            priority: Priority::High,
            title: "Comprehensive financial planning".into(),
            description: format!(
                "With total debts of €{total:.2}, consulting a financial advisor is recommended"
            ),
            reasoning: "A structured repayment strategy keeps a large debt load from growing"
                .into(),
            actions: strings(&[
                "Find a certified financial advisor",
                "Prepare financial documents",
                "Plan a repayment strategy",
                "Review progress regularly",
            ]),
            expected_benefits: strings(&[
                "Significant long-term savings",
                "Clear repayment plan",
                "Fewer missed payments",
            ]),
            estimated_savings: None,
            deadline: self.due(now, self.config.offsets.financial_planning_days),
            effort: Effort::Medium,
            risk: Risk::Low,
            related_entities: Vec::new(),
        }
    }

    fn legal_aid(&self, now: DateTime<Utc>) -> Suggestion {
        Suggestion {
            id: "legal_aid".into(),
            kind: SuggestionKind::Opportunity,
            priority: Priority::Medium,
            title: "Apply for legal aid".into(),
            description: "With high debts you may be eligible for legal aid".into(),
            reasoning: "Debt counselling and legal representation are often free above this level"
                .into(),
            actions: strings(&[
                "Check eligibility for legal aid",
                "Contact a debt counselling service",
                "Gather debt statements for the consultation",
            ]),
            expected_benefits: strings(&["Free legal representation", "Protection from escalation"]),
            estimated_savings: None,
            deadline: self.due(now, self.config.offsets.legal_aid_days),
            effort: Effort::Low,
            risk: Risk::None,
            related_entities: Vec::new(),
        }
    }

    fn time_optimization(&self, now: DateTime<Utc>) -> Suggestion {
        Suggestion {
            id: "time_optimization".into(),
            kind: SuggestionKind::Optimization,
            priority: Priority::Medium,
            title: "Optimize daily schedule for maximum efficiency".into(),
            description: "Analyze current time usage and optimize for better productivity".into(),
            reasoning: "Better time management can free up hours for important tasks".into(),
            actions: strings(&[
                "Track time usage for one week",
                "Identify time wasters and inefficiencies",
                "Create optimized daily schedule",
                "Implement time-blocking technique",
                "Set up productivity routines",
            ]),
            expected_benefits: strings(&[
                "2-3 hours saved per day",
                "Better focus on important tasks",
                "Reduced stress from poor time management",
                "More time for personal activities",
            ]),
            estimated_savings: None,
            deadline: self.due(now, self.config.offsets.time_optimization_days),
            effort: Effort::Medium,
            risk: Risk::Low,
            related_entities: Vec::new(),
        }
    }

    fn energy_optimization(&self, now: DateTime<Utc>) -> Suggestion {
        Suggestion {
            id: "energy_optimization".into(),
            kind: SuggestionKind::Optimization,
            priority: Priority::Medium,
            title: "Optimize energy levels for peak performance".into(),
            description: "Schedule demanding tasks during high-energy periods".into(),
            reasoning: "Matching task difficulty to energy levels improves quality and speed".into(),
            actions: strings(&[
                "Track energy levels throughout the day",
                "Identify peak performance periods",
                "Schedule demanding tasks during high energy",
                "Plan low-energy tasks for low-energy periods",
                "Optimize sleep and nutrition",
            ]),
            expected_benefits: strings(&[
                "Better task completion quality",
                "Faster completion of important tasks",
                "Reduced mental fatigue",
                "Improved overall well-being",
            ]),
            estimated_savings: None,
            deadline: self.due(now, self.config.offsets.energy_optimization_days),
            effort: Effort::Medium,
            risk: Risk::Low,
            related_entities: Vec::new(),
        }
    }
}
