//! Heuristic configuration for pattern analysis and suggestion templates.
//!
//! Every threshold and day offset the analyzer or the suggestion templates
//! use lives here under a named default, so tests and tuning can target them
//! directly. A config can be loaded from TOML; missing keys keep their
//! defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Fraction of a consolidated debt total reported as estimated savings.
pub const DEFAULT_CONSOLIDATION_SAVINGS_RATE: f64 = 0.05;
/// Debts strictly below this amount are "small" (any currency unit).
pub const DEFAULT_SMALL_DEBT_THRESHOLD: f64 = 100.0;
/// Maximum gap in days between consecutive deadlines of one cluster (inclusive).
pub const DEFAULT_CLUSTER_GAP_DAYS: f64 = 7.0;
/// Lower (exclusive) bound of the approaching-deadline window, in days.
pub const DEFAULT_APPROACHING_MIN_DAYS: f64 = 7.0;
/// Upper (exclusive) bound of the approaching-deadline window, in days.
pub const DEFAULT_APPROACHING_MAX_DAYS: f64 = 30.0;
/// Tasks must score strictly above this to count as similar.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.3;
/// Two non-zero amounts closer than this are connected as "similar amount".
pub const DEFAULT_SIMILAR_AMOUNT_TOLERANCE: f64 = 10.0;
/// Consolidation groups above this total count as escalation risks.
pub const DEFAULT_ESCALATION_AMOUNT: f64 = 500.0;
/// Deadlines within this many days (and not yet past) count as urgent.
pub const DEFAULT_URGENT_DEADLINE_DAYS: f64 = 7.0;
/// Total debt above which financial planning is suggested.
pub const DEFAULT_FINANCIAL_PLANNING_THRESHOLD: f64 = 5000.0;
/// Total debt above which legal aid is suggested.
pub const DEFAULT_LEGAL_AID_THRESHOLD: f64 = 2000.0;
/// Largest accepted deadline offset, in days.
pub const MAX_OFFSET_DAYS: i64 = 36_500;

/// Config result alias.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Days from "now" at which each suggestion template sets its deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadlineOffsets {
    pub consolidation_days: i64,
    pub small_debt_days: i64,
    pub bureaucracy_batch_days: i64,
    pub approaching_deadline_days: i64,
    pub blocker_days: i64,
    pub deadline_cluster_days: i64,
    pub time_optimization_days: i64,
    pub energy_optimization_days: i64,
    /// Used for dependency suggestions when the task has no deadline of its own.
    pub dependency_fallback_days: i64,
    pub financial_planning_days: i64,
    pub legal_aid_days: i64,
}

impl Default for DeadlineOffsets {
    fn default() -> Self {
        Self {
            consolidation_days: 30,
            small_debt_days: 7,
            bureaucracy_batch_days: 14,
            approaching_deadline_days: 7,
            blocker_days: 7,
            deadline_cluster_days: 3,
            time_optimization_days: 14,
            energy_optimization_days: 21,
            dependency_fallback_days: 7,
            financial_planning_days: 14,
            legal_aid_days: 28,
        }
    }
}

impl DeadlineOffsets {
    /// Every offset with its TOML key.
    pub fn entries(&self) -> [(&'static str, i64); 11] {
        [
            ("consolidation_days", self.consolidation_days),
            ("small_debt_days", self.small_debt_days),
            ("bureaucracy_batch_days", self.bureaucracy_batch_days),
            ("approaching_deadline_days", self.approaching_deadline_days),
            ("blocker_days", self.blocker_days),
            ("deadline_cluster_days", self.deadline_cluster_days),
            ("time_optimization_days", self.time_optimization_days),
            ("energy_optimization_days", self.energy_optimization_days),
            ("dependency_fallback_days", self.dependency_fallback_days),
            ("financial_planning_days", self.financial_planning_days),
            ("legal_aid_days", self.legal_aid_days),
        ]
    }
}

/// Tunable thresholds for the analyzer and suggestion engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicConfig {
    #[serde(default = "default_savings_rate")]
    pub consolidation_savings_rate: f64,
    #[serde(default = "default_small_debt_threshold")]
    pub small_debt_threshold: f64,
    #[serde(default = "default_cluster_gap_days")]
    pub cluster_gap_days: f64,
    #[serde(default = "default_approaching_min_days")]
    pub approaching_min_days: f64,
    #[serde(default = "default_approaching_max_days")]
    pub approaching_max_days: f64,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_similar_amount_tolerance")]
    pub similar_amount_tolerance: f64,
    #[serde(default = "default_escalation_amount")]
    pub escalation_amount: f64,
    #[serde(default = "default_urgent_deadline_days")]
    pub urgent_deadline_days: f64,
    #[serde(default = "default_financial_planning_threshold")]
    pub financial_planning_threshold: f64,
    #[serde(default = "default_legal_aid_threshold")]
    pub legal_aid_threshold: f64,
    #[serde(default)]
    pub offsets: DeadlineOffsets,
}

fn default_savings_rate() -> f64 {
    DEFAULT_CONSOLIDATION_SAVINGS_RATE
}
fn default_small_debt_threshold() -> f64 {
    DEFAULT_SMALL_DEBT_THRESHOLD
}
fn default_cluster_gap_days() -> f64 {
    DEFAULT_CLUSTER_GAP_DAYS
}
fn default_approaching_min_days() -> f64 {
    DEFAULT_APPROACHING_MIN_DAYS
}
fn default_approaching_max_days() -> f64 {
    DEFAULT_APPROACHING_MAX_DAYS
}
fn default_similarity_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}
fn default_similar_amount_tolerance() -> f64 {
    DEFAULT_SIMILAR_AMOUNT_TOLERANCE
}
fn default_escalation_amount() -> f64 {
    DEFAULT_ESCALATION_AMOUNT
}
fn default_urgent_deadline_days() -> f64 {
    DEFAULT_URGENT_DEADLINE_DAYS
}
fn default_financial_planning_threshold() -> f64 {
    DEFAULT_FINANCIAL_PLANNING_THRESHOLD
}
fn default_legal_aid_threshold() -> f64 {
    DEFAULT_LEGAL_AID_THRESHOLD
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            consolidation_savings_rate: default_savings_rate(),
            small_debt_threshold: default_small_debt_threshold(),
            cluster_gap_days: default_cluster_gap_days(),
            approaching_min_days: default_approaching_min_days(),
            approaching_max_days: default_approaching_max_days(),
            similarity_threshold: default_similarity_threshold(),
            similar_amount_tolerance: default_similar_amount_tolerance(),
            escalation_amount: default_escalation_amount(),
            urgent_deadline_days: default_urgent_deadline_days(),
            financial_planning_threshold: default_financial_planning_threshold(),
            legal_aid_threshold: default_legal_aid_threshold(),
            offsets: DeadlineOffsets::default(),
        }
    }
}

impl HeuristicConfig {
    /// Parse from a TOML string and validate.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Reject non-finite or negative thresholds, out-of-range deadline
    /// offsets and an inverted deadline window.
    pub fn validate(&self) -> ConfigResult<()> {
        let fields = [
            ("consolidation_savings_rate", self.consolidation_savings_rate),
            ("small_debt_threshold", self.small_debt_threshold),
            ("cluster_gap_days", self.cluster_gap_days),
            ("approaching_min_days", self.approaching_min_days),
            ("approaching_max_days", self.approaching_max_days),
            ("similarity_threshold", self.similarity_threshold),
            ("similar_amount_tolerance", self.similar_amount_tolerance),
            ("escalation_amount", self.escalation_amount),
            ("urgent_deadline_days", self.urgent_deadline_days),
            ("financial_planning_threshold", self.financial_planning_threshold),
            ("legal_aid_threshold", self.legal_aid_threshold),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("{value} must be a finite number >= 0"),
                });
            }
        }
        for (field, days) in self.offsets.entries() {
            if !(0..=MAX_OFFSET_DAYS).contains(&days) {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("{days} must be between 0 and {MAX_OFFSET_DAYS} days"),
                });
            }
        }
        if self.approaching_min_days >= self.approaching_max_days {
            return Err(ConfigError::Invalid {
                field: "approaching_min_days",
                message: format!(
                    "{} must be below approaching_max_days ({})",
                    self.approaching_min_days, self.approaching_max_days
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_named_constants() {
        let config = HeuristicConfig::default();
        assert_eq!(config.consolidation_savings_rate, 0.05);
        assert_eq!(config.cluster_gap_days, 7.0);
        assert_eq!(config.similarity_threshold, 0.3);
        assert_eq!(config.offsets.consolidation_days, 30);
        assert_eq!(config.offsets.deadline_cluster_days, 3);
        assert_eq!(config.financial_planning_threshold, 5000.0);
        assert_eq!(config.legal_aid_threshold, 2000.0);
        assert_eq!(config.offsets.legal_aid_days, 28);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = HeuristicConfig::from_toml_str(
            "cluster_gap_days = 3.0\n[offsets]\nconsolidation_days = 45\n",
        )
        .unwrap();
        assert_eq!(config.cluster_gap_days, 3.0);
        assert_eq!(config.offsets.consolidation_days, 45);
        assert_eq!(config.offsets.small_debt_days, 7);
        assert_eq!(config.small_debt_threshold, 100.0);
    }

    #[test]
    fn inverted_window_rejected() {
        let err = HeuristicConfig::from_toml_str(
            "approaching_min_days = 40.0\napproaching_max_days = 30.0\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "approaching_min_days",
                ..
            }
        ));
    }

    #[test]
    fn negative_threshold_rejected() {
        let err = HeuristicConfig::from_toml_str("similarity_threshold = -0.1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn out_of_range_offsets_rejected() {
        let err = HeuristicConfig::from_toml_str("[offsets]\nconsolidation_days = 9000000000000\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "consolidation_days",
                ..
            }
        ));

        let err = HeuristicConfig::from_toml_str("[offsets]\nlegal_aid_days = -1\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "legal_aid_days",
                ..
            }
        ));

        let ok = HeuristicConfig::from_toml_str(&format!(
            "[offsets]\nsmall_debt_days = {MAX_OFFSET_DAYS}\n"
        ))
        .unwrap();
        assert_eq!(ok.offsets.small_debt_days, MAX_OFFSET_DAYS);
    }

    #[test]
    fn bad_syntax_is_parse_error() {
        let err = HeuristicConfig::from_toml_str("cluster_gap_days = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn toml_roundtrip_via_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("heuristics.toml");
        let mut config = HeuristicConfig::default();
        config.small_debt_threshold = 250.0;
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();
        let loaded = HeuristicConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = HeuristicConfig::load(Path::new("/nonexistent/heuristics.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
