// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Visit lifecycle routes.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{GeoPoint, Visit, VisitStatus};
use crate::services::visit::AssignVisitParams;
use crate::time_utils::{self, format_utc_rfc3339, DateRange};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/visits", get(list_visits))
        .route("/api/visits/check-in", post(check_in))
        .route("/api/visits/check-out", post(check_out_untracked))
        .route("/api/visits/assign", post(assign))
        .route("/api/visits/{id}", get(get_visit).delete(delete_visit))
        .route("/api/visits/{id}/check-out", post(check_out))
        .route("/api/visits/{id}/complete", post(complete_assigned))
        .route("/api/visits/{id}/cancel", post(cancel))
}

// ─── Check-in ────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CheckInRequest {
    #[validate(length(min = 1))]
    pub poi_id: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
}

/// Check in at a POI. Rejected with `too_far` beyond the geofence radius.
async fn check_in(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CheckInRequest>,
) -> Result<Json<Visit>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let poi = state
        .db
        .get_poi(&req.poi_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("POI {} not found", req.poi_id)))?;

    let rep_name = display_name(&state, &user.user_id).await?;
    let visit = state
        .lifecycle
        .check_in(
            &user.user_id,
            &rep_name,
            &poi,
            GeoPoint::new(req.lat, req.lng),
        )
        .await?;

    Ok(Json(visit))
}

// ─── Checkout ────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CheckOutRequest {
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Check out of a persisted visit.
async fn check_out(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(visit_id): Path<String>,
    Json(req): Json<CheckOutRequest>,
) -> Result<Json<Visit>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let visit = load_visit_for(&state, &user, &visit_id).await?;
    let visit = state.lifecycle.check_out(visit, req.notes).await?;

    Ok(Json(visit))
}

#[derive(Deserialize, Validate)]
pub struct CheckOutUntrackedRequest {
    pub poi_id: Option<String>,
    /// Free-text location; falls back to "Unknown Location" when absent
    #[validate(length(max = 200))]
    pub poi_name: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[serde(default)]
    pub product_interests: Vec<String>,
    /// When the rep actually arrived, if the client tracked it (RFC3339)
    pub check_in_time: Option<String>,
    /// Authoritative duration captured by the client
    pub duration_seconds: Option<i64>,
}

/// Check out of a visit that was never persisted (an untracked stop).
/// Creates the completed visit record directly.
async fn check_out_untracked(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CheckOutUntrackedRequest>,
) -> Result<Json<Visit>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let rep_name = display_name(&state, &user.user_id).await?;
    let now_str = format_utc_rfc3339(Utc::now());

    let placeholder = Visit {
        id: uuid::Uuid::new_v4().to_string(),
        rep_id: user.user_id.clone(),
        rep_name,
        poi_id: req.poi_id,
        poi_name: req.poi_name.unwrap_or_default(),
        poi_address: None,
        poi_contact: None,
        status: VisitStatus::CheckedIn,
        check_in_time: req.check_in_time,
        check_out_time: None,
        duration_seconds: req.duration_seconds,
        duration_minutes: None,
        notes: None,
        completion_notes: None,
        product_interests: req.product_interests,
        familiar_with_product: None,
        interested: None,
        check_in_location: None,
        assigned_worker_id: None,
        assigned_worker_name: None,
        visit_date: now_str,
    };

    let visit = state.lifecycle.check_out(placeholder, req.notes).await?;

    Ok(Json(visit))
}

// ─── Assignment ──────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct AssignVisitRequest {
    /// Present when editing an existing assignment
    pub visit_id: Option<String>,
    #[validate(length(min = 1))]
    pub poi_id: String,
    #[validate(length(min = 1))]
    pub assignee_id: String,
    /// Defaults to now; may be in the future (RFC3339)
    pub visit_date: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[serde(default)]
    pub product_interests: Vec<String>,
    /// Ternary flags; both must be answered before submission
    pub familiar_with_product: Option<bool>,
    pub interested: Option<bool>,
}

/// Create or edit a manager assignment.
async fn assign(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<AssignVisitRequest>,
) -> Result<Json<Visit>> {
    user.require_manager()?;
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    // The ternary flags block submission before anything is read or
    // written; an unset flag means the form was not finished.
    if req.familiar_with_product.is_none() {
        return Err(AppError::Validation(
            "familiar_with_product must be answered".to_string(),
        ));
    }
    if req.interested.is_none() {
        return Err(AppError::Validation(
            "interested must be answered".to_string(),
        ));
    }

    let visit_date = req
        .visit_date
        .as_deref()
        .map(|raw| {
            time_utils::parse_rfc3339(raw).ok_or_else(|| {
                AppError::Validation("visit_date must be an RFC3339 datetime".to_string())
            })
        })
        .transpose()?;

    let poi = state
        .db
        .get_poi(&req.poi_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("POI {} not found", req.poi_id)))?;

    let assignee = state
        .db
        .get_user(&req.assignee_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", req.assignee_id)))?;

    let visit = state
        .lifecycle
        .assign(AssignVisitParams {
            existing_visit_id: req.visit_id,
            poi,
            assignee_id: assignee.id,
            assignee_name: assignee.display_name,
            visit_date,
            notes: req.notes,
            product_interests: req.product_interests,
            familiar_with_product: req.familiar_with_product,
            interested: req.interested,
        })
        .await?;

    Ok(Json(visit))
}

// ─── Assigned completion / cancel / delete ───────────────────

#[derive(Deserialize, Validate)]
pub struct CompleteVisitRequest {
    #[validate(length(min = 1, max = 2000))]
    pub completion_notes: String,
}

/// Close out an assigned visit (assignee only).
async fn complete_assigned(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(visit_id): Path<String>,
    Json(req): Json<CompleteVisitRequest>,
) -> Result<Json<Visit>> {
    let visit = state
        .lifecycle
        .complete_assigned(&visit_id, &user.user_id, &req.completion_notes)
        .await?;

    Ok(Json(visit))
}

/// Cancel a pending visit.
async fn cancel(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(visit_id): Path<String>,
) -> Result<Json<Visit>> {
    let visit = state
        .lifecycle
        .cancel(&visit_id, &user.user_id, user.role)
        .await?;

    Ok(Json(visit))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteVisitResponse {
    pub success: bool,
}

/// Hard-delete a visit record (manager only). Side effects already
/// applied to POI summaries and history records are not retracted.
async fn delete_visit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(visit_id): Path<String>,
) -> Result<Json<DeleteVisitResponse>> {
    user.require_manager()?;

    state.lifecycle.delete(&visit_id).await?;
    tracing::info!(visit_id = %visit_id, manager_id = %user.user_id, "Visit deleted");

    Ok(Json(DeleteVisitResponse { success: true }))
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct VisitsQuery {
    /// Filter by status
    status: Option<String>,
    /// Calendar bucket: "today", "week" (rolling) or "month"
    bucket: Option<String>,
    /// Client timezone offset for bucket boundaries
    #[serde(default)]
    utc_offset_minutes: i32,
    /// Managers may list another rep's visits
    rep_id: Option<String>,
    /// Pagination: page number (1-indexed)
    #[serde(default = "default_page")]
    page: u32,
    /// Pagination: items per page
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_page() -> u32 {
    1
}
fn default_per_page() -> u32 {
    50
}

const MAX_PER_PAGE: u32 = 100;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VisitsResponse {
    pub visits: Vec<Visit>,
    pub page: u32,
    pub per_page: u32,
}

/// List visits for the caller (or, for managers, any rep), newest first.
async fn list_visits(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<VisitsQuery>,
) -> Result<Json<VisitsResponse>> {
    if query.page == 0 {
        return Err(AppError::BadRequest("page must be >= 1".to_string()));
    }
    if query.per_page == 0 || query.per_page > MAX_PER_PAGE {
        return Err(AppError::BadRequest(format!(
            "per_page must be between 1 and {}",
            MAX_PER_PAGE
        )));
    }

    let status = query
        .status
        .as_deref()
        .map(|raw| {
            parse_status(raw)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown status '{}'", raw)))
        })
        .transpose()?;

    let range = query
        .bucket
        .as_deref()
        .map(|raw| bucket_range(raw, query.utc_offset_minutes))
        .transpose()?;

    let rep_id = match &query.rep_id {
        Some(other) if other != &user.user_id => {
            user.require_manager()?;
            other.clone()
        }
        _ => user.user_id.clone(),
    };

    let offset = (query.page - 1) * query.per_page;
    let visits = state
        .db
        .query_visits(Some(rep_id.as_str()), status, range, query.per_page, offset)
        .await?;

    Ok(Json(VisitsResponse {
        visits,
        page: query.page,
        per_page: query.per_page,
    }))
}

/// Get one visit.
async fn get_visit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(visit_id): Path<String>,
) -> Result<Json<Visit>> {
    let visit = load_visit_for(&state, &user, &visit_id).await?;
    Ok(Json(visit))
}

// ─── Helpers ─────────────────────────────────────────────────

fn parse_status(raw: &str) -> Option<VisitStatus> {
    match raw {
        "checked-in" => Some(VisitStatus::CheckedIn),
        "assigned" => Some(VisitStatus::Assigned),
        "completed" => Some(VisitStatus::Completed),
        "cancelled" => Some(VisitStatus::Cancelled),
        _ => None,
    }
}

/// Bucket boundaries in the client's local time. The visit screens use a
/// rolling week; the Sunday-anchored week belongs to the task list only.
fn bucket_range(raw: &str, utc_offset_minutes: i32) -> Result<DateRange> {
    let offset = FixedOffset::east_opt(utc_offset_minutes * 60)
        .ok_or_else(|| AppError::BadRequest("Invalid utc_offset_minutes".to_string()))?;
    let now = Utc::now().with_timezone(&offset);

    match raw {
        "today" => Ok(time_utils::today_range(now)),
        "week" => Ok(time_utils::rolling_week_range(now)),
        "month" => Ok(time_utils::month_range(now)),
        other => Err(AppError::BadRequest(format!(
            "Unknown bucket '{}' (expected today, week or month)",
            other
        ))),
    }
}

/// Load a visit the caller is allowed to see: the owning rep, the
/// assigned worker, or any manager.
async fn load_visit_for(state: &AppState, user: &AuthUser, visit_id: &str) -> Result<Visit> {
    let visit = state
        .db
        .get_visit(visit_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Visit {} not found", visit_id)))?;

    let is_owner = visit.rep_id == user.user_id
        || visit.assigned_worker_id.as_deref() == Some(user.user_id.as_str());
    if !is_owner && !user.role.is_manager() {
        return Err(AppError::Forbidden(
            "Not allowed to access this visit".to_string(),
        ));
    }

    Ok(visit)
}

async fn display_name(state: &AppState, user_id: &str) -> Result<String> {
    Ok(state
        .db
        .get_user(user_id)
        .await?
        .map(|u| u.display_name)
        .unwrap_or_else(|| user_id.to_string()))
}
