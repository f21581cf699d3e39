// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Visit lifecycle service.
//!
//! Owns the legal transitions of a visit and the multi-collection write
//! protocol that keeps POI summaries, rep presence, history snapshots and
//! rep counters consistent with visit records:
//! 1. Check-in: geofence admission, visit create + presence merge
//! 2. Assignment: validation, visit write + assigned-count bump
//! 3. Checkout: duration derivation, visit + POI summary + presence +
//!    history + counters in one transaction
//! 4. Assigned completion: status flip only, no denormalized writes

use chrono::{DateTime, Utc};

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{
    GeoPoint, Poi, PoiLastVisit, PresenceCheckIn, PresenceCheckOut, PresenceStatus, Role, Visit,
    VisitHistoryRecord, VisitStatus,
};
use crate::services::geofence::GeofencePolicy;
use crate::time_utils::{format_utc_rfc3339, parse_rfc3339};

/// Fallback POI name when a checkout arrives without identification.
/// Checkout must never be blocked by a missing name.
const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Parameters for a manager assignment (create or edit).
#[derive(Debug, Clone)]
pub struct AssignVisitParams {
    /// Set when editing an existing assignment; the counter is only
    /// bumped for new assignments.
    pub existing_visit_id: Option<String>,
    pub poi: Poi,
    pub assignee_id: String,
    pub assignee_name: String,
    /// Defaults to now; may be in the future.
    pub visit_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub product_interests: Vec<String>,
    /// Ternary: None means the manager has not answered yet, which blocks
    /// submission before any write happens.
    pub familiar_with_product: Option<bool>,
    pub interested: Option<bool>,
}

/// Enforces visit state transitions and performs the associated writes.
#[derive(Clone)]
pub struct VisitLifecycle {
    db: FirestoreDb,
    geofence: GeofencePolicy,
}

impl VisitLifecycle {
    pub fn new(db: FirestoreDb, geofence: GeofencePolicy) -> Self {
        Self { db, geofence }
    }

    /// Check a representative in at a POI.
    ///
    /// Rejects with `TooFar` when the rep stands more than the geofence
    /// radius from the POI coordinate. On success the visit create and
    /// presence merge commit together.
    pub async fn check_in(
        &self,
        rep_id: &str,
        rep_name: &str,
        poi: &Poi,
        location: GeoPoint,
    ) -> Result<Visit> {
        let poi_location = poi
            .location
            .ok_or_else(|| AppError::Validation(format!("POI '{}' has no coordinate", poi.name)))?;

        let distance = self.geofence.admit(location, poi_location)?;
        tracing::debug!(poi_id = %poi.id, distance_m = distance, "Geofence admitted check-in");

        let now = Utc::now();
        let now_str = format_utc_rfc3339(now);

        let visit = Visit {
            id: uuid::Uuid::new_v4().to_string(),
            rep_id: rep_id.to_string(),
            rep_name: rep_name.to_string(),
            poi_id: Some(poi.id.clone()),
            poi_name: poi.name.clone(),
            poi_address: poi.address.clone(),
            poi_contact: poi.contact.clone(),
            status: VisitStatus::CheckedIn,
            check_in_time: Some(now_str.clone()),
            check_out_time: None,
            duration_seconds: None,
            duration_minutes: None,
            notes: None,
            completion_notes: None,
            product_interests: Vec::new(),
            familiar_with_product: None,
            interested: None,
            check_in_location: Some(location),
            assigned_worker_id: None,
            assigned_worker_name: None,
            visit_date: now_str.clone(),
        };

        let presence = PresenceCheckIn {
            rep_id: rep_id.to_string(),
            rep_name: rep_name.to_string(),
            status: vec![PresenceStatus::CheckedIn],
            last_check_in_location: location,
            last_check_in_at: now_str,
            current_visit_id: visit.id.clone(),
            current_poi_id: visit.poi_id.clone(),
        };

        self.db.commit_check_in(&visit, &presence).await?;

        Ok(visit)
    }

    /// Create or edit a manager assignment.
    ///
    /// All validation happens before any write; a rejected assignment has
    /// zero side effects.
    pub async fn assign(&self, params: AssignVisitParams) -> Result<Visit> {
        validate_assignment(&params)?;

        let now = Utc::now();
        let visit_date = format_utc_rfc3339(params.visit_date.unwrap_or(now));

        if let Some(visit_id) = &params.existing_visit_id {
            // Edit in place; the assigned-count counter is not touched.
            let mut visit = self
                .db
                .get_visit(visit_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Visit {} not found", visit_id)))?;

            if !visit.status.can_transition_to(VisitStatus::Assigned) {
                return Err(AppError::BadRequest(format!(
                    "Cannot edit a visit with status '{}'",
                    visit.status.as_str()
                )));
            }

            visit.poi_id = Some(params.poi.id.clone());
            visit.poi_name = params.poi.name.clone();
            visit.poi_address = params.poi.address.clone();
            visit.poi_contact = params.poi.contact.clone();
            visit.assigned_worker_id = Some(params.assignee_id.clone());
            visit.assigned_worker_name = Some(params.assignee_name.clone());
            visit.visit_date = visit_date;
            visit.notes = params.notes.clone();
            visit.product_interests = params.product_interests.clone();
            visit.familiar_with_product = params.familiar_with_product;
            visit.interested = params.interested;

            self.db.upsert_visit(&visit).await?;
            return Ok(visit);
        }

        let visit = Visit {
            id: uuid::Uuid::new_v4().to_string(),
            rep_id: params.assignee_id.clone(),
            rep_name: params.assignee_name.clone(),
            poi_id: Some(params.poi.id.clone()),
            poi_name: params.poi.name.clone(),
            poi_address: params.poi.address.clone(),
            poi_contact: params.poi.contact.clone(),
            status: VisitStatus::Assigned,
            check_in_time: None,
            check_out_time: None,
            duration_seconds: None,
            duration_minutes: None,
            notes: params.notes.clone(),
            completion_notes: None,
            product_interests: params.product_interests.clone(),
            familiar_with_product: params.familiar_with_product,
            interested: params.interested,
            check_in_location: None,
            assigned_worker_id: Some(params.assignee_id.clone()),
            assigned_worker_name: Some(params.assignee_name.clone()),
            visit_date,
        };

        self.db.commit_assignment(&visit, &params.assignee_id).await?;

        Ok(visit)
    }

    /// Check a visit out, completing it.
    ///
    /// Accepts either a persisted visit or a synthetic placeholder that
    /// was never written (a rep closing out an untracked stop). Not
    /// guarded against double submission: a second checkout overwrites
    /// timestamps and appends a second history record.
    pub async fn check_out(&self, visit: Visit, notes: Option<String>) -> Result<Visit> {
        let now = Utc::now();
        let (visit, history_doc_id, history) = finalize_checkout(visit, notes, now);

        let poi_last_visit = visit.poi_id.as_ref().map(|_| PoiLastVisit {
            last_visit_at: history.recorded_at.clone(),
            last_visit_rep: visit.rep_name.clone(),
            last_visit_duration_minutes: visit.duration_minutes.unwrap_or(0),
        });
        let poi_update = visit
            .poi_id
            .as_deref()
            .zip(poi_last_visit.as_ref());

        let presence = PresenceCheckOut {
            status: vec![PresenceStatus::Available],
            last_check_out_at: history.recorded_at.clone(),
            current_visit_id: None,
            current_poi_id: None,
        };

        self.db
            .commit_check_out(&visit, poi_update, &presence, &history_doc_id, &history)
            .await?;

        Ok(visit)
    }

    /// Close out a manager-assigned visit (distinct from checkout: used
    /// by the assignee without the POI check-in flow, and deliberately
    /// performs no POI/presence side effects).
    pub async fn complete_assigned(
        &self,
        visit_id: &str,
        caller_id: &str,
        completion_notes: &str,
    ) -> Result<Visit> {
        if completion_notes.trim().is_empty() {
            return Err(AppError::Validation(
                "completion_notes must not be empty".to_string(),
            ));
        }

        let mut visit = self
            .db
            .get_visit(visit_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Visit {} not found", visit_id)))?;

        if visit.assigned_worker_id.as_deref() != Some(caller_id) {
            return Err(AppError::Forbidden(
                "Only the assigned worker can complete this visit".to_string(),
            ));
        }

        if !visit.status.can_transition_to(VisitStatus::Completed) {
            return Err(AppError::BadRequest(format!(
                "Cannot complete a visit with status '{}'",
                visit.status.as_str()
            )));
        }

        visit.status = VisitStatus::Completed;
        visit.completion_notes = Some(completion_notes.to_string());
        visit.check_out_time = Some(format_utc_rfc3339(Utc::now()));

        self.db.upsert_visit(&visit).await?;

        Ok(visit)
    }

    /// Cancel a pending visit. Allowed for the owning rep, the assigned
    /// worker, or a manager.
    pub async fn cancel(&self, visit_id: &str, caller_id: &str, caller_role: Role) -> Result<Visit> {
        let mut visit = self
            .db
            .get_visit(visit_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Visit {} not found", visit_id)))?;

        let is_owner = visit.rep_id == caller_id
            || visit.assigned_worker_id.as_deref() == Some(caller_id);
        if !is_owner && !caller_role.is_manager() {
            return Err(AppError::Forbidden(
                "Not allowed to cancel this visit".to_string(),
            ));
        }

        if !visit.status.can_transition_to(VisitStatus::Cancelled) {
            return Err(AppError::BadRequest(format!(
                "Cannot cancel a visit with status '{}'",
                visit.status.as_str()
            )));
        }

        visit.status = VisitStatus::Cancelled;
        self.db.upsert_visit(&visit).await?;

        Ok(visit)
    }

    /// Hard-delete a visit record. POI summary and history side effects
    /// already applied are not retracted. Role enforcement happens at the
    /// route layer.
    pub async fn delete(&self, visit_id: &str) -> Result<()> {
        self.db.delete_visit(visit_id).await
    }
}

/// Assignment validation: both ternary flags answered, contact present.
fn validate_assignment(params: &AssignVisitParams) -> Result<()> {
    if params.familiar_with_product.is_none() {
        return Err(AppError::Validation(
            "familiar_with_product must be answered".to_string(),
        ));
    }
    if params.interested.is_none() {
        return Err(AppError::Validation(
            "interested must be answered".to_string(),
        ));
    }
    let has_contact = params
        .poi
        .contact
        .as_ref()
        .is_some_and(|c| c.name.is_some() || c.phone.is_some());
    if !has_contact {
        return Err(AppError::Validation(
            "contact is required for an assignment".to_string(),
        ));
    }
    if params.assignee_id.trim().is_empty() {
        return Err(AppError::Validation("assignee is required".to_string()));
    }
    Ok(())
}

/// Duration of a completed visit in minutes.
///
/// An authoritative `duration_seconds` captured by the client wins;
/// otherwise fall back to the check-in time, then the visit date, then
/// zero.
fn duration_minutes_at(visit: &Visit, now: DateTime<Utc>) -> i64 {
    if let Some(seconds) = visit.duration_seconds {
        return ((seconds as f64) / 60.0).round() as i64;
    }
    if let Some(checked_in) = visit.check_in_time.as_deref().and_then(parse_rfc3339) {
        return (now - checked_in).num_minutes().max(0);
    }
    if let Some(dated) = parse_rfc3339(&visit.visit_date) {
        return (now - dated).num_minutes().max(0);
    }
    0
}

/// Build the final visit state and its immutable history snapshot.
///
/// Pure so the checkout math is testable without a backend. Returns the
/// completed visit, the history document ID and the history record.
fn finalize_checkout(
    mut visit: Visit,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> (Visit, String, VisitHistoryRecord) {
    if visit.poi_name.trim().is_empty() {
        visit.poi_name = UNKNOWN_LOCATION.to_string();
    }

    let now_str = format_utc_rfc3339(now);
    visit.duration_minutes = Some(duration_minutes_at(&visit, now));
    visit.status = VisitStatus::Completed;
    visit.check_out_time = Some(now_str.clone());
    if let Some(notes) = notes {
        visit.notes = Some(notes);
    }

    let history_doc_id = format!("{}_{}", visit.id, now.timestamp());
    let history = VisitHistoryRecord {
        visit_id: visit.id.clone(),
        recorded_at: now_str,
        visit: visit.clone(),
    };

    (visit, history_doc_id, history)
}
