// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Visit model: one representative's interaction with one POI.

use serde::{Deserialize, Serialize};

use crate::models::geo::GeoPoint;
use crate::models::poi::Contact;

/// Lifecycle status of a visit.
///
/// `checked-in` and `assigned` are the two entry states; `completed` and
/// `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisitStatus {
    CheckedIn,
    Assigned,
    Completed,
    Cancelled,
}

impl VisitStatus {
    /// Legal state-machine edges. Status only moves forward; terminal
    /// states have no outgoing edges. Re-assigning an `assigned` visit
    /// (manager edit) keeps it in place.
    pub fn can_transition_to(self, next: VisitStatus) -> bool {
        use VisitStatus::*;
        matches!(
            (self, next),
            (CheckedIn, Completed)
                | (CheckedIn, Cancelled)
                | (Assigned, Assigned)
                | (Assigned, Completed)
                | (Assigned, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, VisitStatus::Completed | VisitStatus::Cancelled)
    }

    /// Wire spelling, as stored in Firestore and used in query filters.
    pub fn as_str(self) -> &'static str {
        match self {
            VisitStatus::CheckedIn => "checked-in",
            VisitStatus::Assigned => "assigned",
            VisitStatus::Completed => "completed",
            VisitStatus::Cancelled => "cancelled",
        }
    }
}

/// Stored visit record in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    /// Document ID (UUID v4)
    pub id: String,
    /// Owning representative (auth provider local ID)
    pub rep_id: String,
    /// Representative display name (denormalized for list views)
    pub rep_name: String,
    /// POI document ID; None for free-text/unregistered locations
    pub poi_id: Option<String>,
    /// POI name; must be non-empty before completion
    pub poi_name: String,
    pub poi_address: Option<String>,
    pub poi_contact: Option<Contact>,
    pub status: VisitStatus,
    /// When the rep checked in (RFC3339); None for assigned visits
    pub check_in_time: Option<String>,
    /// When the visit was completed (RFC3339)
    pub check_out_time: Option<String>,
    /// Authoritative duration captured by the client, if any
    pub duration_seconds: Option<i64>,
    /// Derived at checkout; populated only when status is `completed`
    pub duration_minutes: Option<i64>,
    pub notes: Option<String>,
    /// Set by the assigned-completion path only
    pub completion_notes: Option<String>,
    /// Product-interest strings gathered during the visit
    #[serde(default)]
    pub product_interests: Vec<String>,
    /// Ternary assignment flags; must be explicitly set (true or false)
    /// before an assignment is accepted
    pub familiar_with_product: Option<bool>,
    pub interested: Option<bool>,
    /// Where the rep stood at check-in
    pub check_in_location: Option<GeoPoint>,
    /// Worker the visit was assigned to (manager assignment path)
    pub assigned_worker_id: Option<String>,
    pub assigned_worker_name: Option<String>,
    /// Calendar date of the visit (RFC3339), used for bucketing
    pub visit_date: String,
}

/// Immutable history record appended at checkout.
///
/// Duplicates the final visit state for audit/reporting and is never
/// updated after the write. Document ID: `{visit_id}_{checkout_unix}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitHistoryRecord {
    /// The visit this record snapshots
    pub visit_id: String,
    /// When the snapshot was taken (RFC3339)
    pub recorded_at: String,
    #[serde(flatten)]
    pub visit: Visit,
}
