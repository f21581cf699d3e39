//! Per-representative counter aggregates.
//!
//! Pre-computed when visits are written, so manager dashboards read one
//! document instead of counting visit records.

use serde::{Deserialize, Serialize};

/// Counter record for one representative.
///
/// Stored in `rep_stats`, keyed by rep ID. Updated inside the same
/// Firestore transaction as the visit write it reflects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepStats {
    /// Visits assigned to this rep (incremented on new assignment only,
    /// not on assignment edits)
    #[serde(default)]
    pub assigned_visit_count: u32,
    /// Visits this rep checked out
    #[serde(default)]
    pub completed_visit_count: u32,
    /// Sum of completed visit durations
    #[serde(default)]
    pub total_duration_minutes: i64,
    /// Last update timestamp (RFC3339)
    #[serde(default)]
    pub updated_at: String,
}

impl Default for RepStats {
    fn default() -> Self {
        Self {
            assigned_visit_count: 0,
            completed_visit_count: 0,
            total_duration_minutes: 0,
            updated_at: String::new(),
        }
    }
}

impl RepStats {
    /// Record a new assignment.
    pub fn record_assignment(&mut self, now: &str) {
        self.assigned_visit_count += 1;
        self.updated_at = now.to_string();
    }

    /// Record a completed visit and its duration.
    pub fn record_completion(&mut self, duration_minutes: i64, now: &str) {
        self.completed_visit_count += 1;
        self.total_duration_minutes += duration_minutes;
        self.updated_at = now.to_string();
    }
}
