//! Progress tracking for suggested actions.
//!
//! Each action id owns a small state machine:
//!
//! ```text
//! pending --(progress > 0)--> in_progress --(progress >= 100)--> completed
//!    \________________________(progress >= 100)______________________/
//! ```
//!
//! Records are created lazily on the first report and never leave
//! `completed`. Reported values are clamped to `0..=100`.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Pending,
    InProgress,
    Completed,
}

/// Tracked state of one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionProgress {
    pub id: String,
    pub status: ProgressStatus,
    /// Percentage in `0..=100`.
    pub progress: u8,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Time of the first report reaching 100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ActionProgress {
    fn new(id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            status: ProgressStatus::Pending,
            progress: 0,
            started_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ProgressStatus::Completed
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Keyed progress records, in creation order.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    actions: IndexMap<String, ActionProgress>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record progress for `id` as of now.
    pub fn track_progress(&mut self, id: impl Into<String>, progress: f64) -> &ActionProgress {
        self.track_progress_at(id, progress, Utc::now())
    }

    /// Record progress for `id` as of `now`.
    pub fn track_progress_at(
        &mut self,
        id: impl Into<String>,
        progress: f64,
        now: DateTime<Utc>,
    ) -> &ActionProgress {
        let id = id.into();
        let value = clamp_percent(progress);
        let record = self
            .actions
            .entry(id.clone())
            .or_insert_with(|| ActionProgress::new(id, now));

        // Status follows the reported value; only the stored percentage is
        // rounded, and it stays inside the band its status implies.
        record.updated_at = now;
        if value >= 100.0 {
            record.status = ProgressStatus::Completed;
            record.completed_at.get_or_insert(now);
            record.progress = 100;
        } else if value > 0.0 {
            if !record.is_completed() {
                record.status = ProgressStatus::InProgress;
            }
            record.progress = (value.round() as u8).clamp(1, 99);
        } else {
            record.progress = 0;
        }

        tracing::debug!(
            id = %record.id,
            progress = record.progress,
            status = ?record.status,
            "tracked action progress"
        );
        record
    }

    /// Current record for `id`, if any progress was ever reported.
    pub fn status(&self, id: &str) -> Option<&ActionProgress> {
        self.actions.get(id)
    }

    /// All records in creation order.
    pub fn all(&self) -> impl Iterator<Item = &ActionProgress> {
        self.actions.values()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn lifecycle() {
        let mut tracker = ProgressTracker::new();
        let t0 = Utc::now();

        let rec = tracker.track_progress_at("a", 0.0, t0);
        assert_eq!(rec.status, ProgressStatus::Pending);
        assert_eq!(rec.progress, 0);
        assert_eq!(rec.started_at, t0);

        let t1 = t0 + Duration::minutes(5);
        let rec = tracker.track_progress_at("a", 45.0, t1);
        assert_eq!(rec.status, ProgressStatus::InProgress);
        assert_eq!(rec.progress, 45);
        assert_eq!(rec.updated_at, t1);
        assert_eq!(rec.started_at, t0);

        let t2 = t1 + Duration::minutes(5);
        let rec = tracker.track_progress_at("a", 150.0, t2);
        assert_eq!(rec.status, ProgressStatus::Completed);
        assert_eq!(rec.progress, 100);
        assert_eq!(rec.completed_at, Some(t2));
    }

    #[test]
    fn completed_is_terminal() {
        let mut tracker = ProgressTracker::new();
        let t0 = Utc::now();
        tracker.track_progress_at("a", 100.0, t0);

        let t1 = t0 + Duration::hours(1);
        let rec = tracker.track_progress_at("a", 30.0, t1);
        assert_eq!(rec.status, ProgressStatus::Completed);
        assert_eq!(rec.progress, 30);
        assert_eq!(rec.updated_at, t1);
        assert_eq!(rec.completed_at, Some(t0));
    }

    #[test]
    fn clamps_out_of_range_values() {
        let mut tracker = ProgressTracker::new();
        assert_eq!(tracker.track_progress("neg", -20.0).progress, 0);
        assert_eq!(tracker.track_progress("neg", -20.0).status, ProgressStatus::Pending);
        assert_eq!(tracker.track_progress("nan", f64::NAN).progress, 0);
        assert_eq!(tracker.track_progress("half", 49.6).progress, 50);
    }

    #[test]
    fn status_follows_reported_value_not_rounded_percent() {
        let mut tracker = ProgressTracker::new();

        let almost = tracker.track_progress("almost", 99.6);
        assert_eq!(almost.status, ProgressStatus::InProgress);
        assert_eq!(almost.progress, 99);
        assert!(almost.completed_at.is_none());

        let barely = tracker.track_progress("barely", 0.4);
        assert_eq!(barely.status, ProgressStatus::InProgress);
        assert_eq!(barely.progress, 1);
    }

    #[test]
    fn lookup_and_listing() {
        let mut tracker = ProgressTracker::new();
        assert!(tracker.status("x").is_none());
        tracker.track_progress("b", 10.0);
        tracker.track_progress("a", 20.0);
        tracker.track_progress("b", 30.0);
        let ids: Vec<&str> = tracker.all().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(tracker.status("b").unwrap().progress, 30);
        assert_eq!(tracker.len(), 2);
    }
}
