// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # lifegraph
//!
//! A small knowledge graph of life-management records (tasks, debts,
//! bureaucratic processes) with a rule-based engine that turns structural
//! patterns into ranked, actionable suggestions.
//!
//! ## Architecture
//!
//! - **Knowledge graph** (`graph`): insertion-ordered entity and relationship
//!   stores with fixed lookups, keyword search and task similarity
//! - **Storage** (`store`): pluggable write-through backend (memory or redb)
//! - **Pattern analysis** (`analyze`): consolidation, deadline clusters,
//!   dependency chains, small debts, bureaucracy batches, blockers, plus
//!   informational connections, process types and risk buckets
//! - **Suggestions** (`suggest`, `prioritize`): fixed templates, ranked by
//!   priority tier and kind weight
//! - **Progress** (`progress`): per-action completion state machine
//! - **Service** (`proactive`): ties the pieces together
//!
//! ## Library usage
//!
//! ```no_run
//! use lifegraph::config::HeuristicConfig;
//! use lifegraph::proactive::{AnalysisContext, ProactiveActions};
//! use lifegraph::records::DebtRecord;
//!
//! let mut service = ProactiveActions::new(HeuristicConfig::default());
//! let debts = vec![
//!     DebtRecord { id: "d1".into(), creditor_name: Some("Bank".into()), amount: Some(250.0), ..Default::default() },
//!     DebtRecord { id: "d2".into(), creditor_name: Some("Bank".into()), amount: Some(90.0), ..Default::default() },
//! ];
//! for s in service.analyze_and_suggest_actions(Vec::new(), debts, Vec::new(), &AnalysisContext::default()) {
//!     println!("[{:?}] {}", s.priority, s.title);
//! }
//! ```

pub mod analyze;
pub mod config;
pub mod entity;
pub mod error;
pub mod graph;
pub mod prioritize;
pub mod proactive;
pub mod progress;
pub mod records;
pub mod store;
pub mod suggest;
