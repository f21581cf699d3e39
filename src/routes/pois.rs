// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! POI routes: CRUD plus the informational distance check.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Contact, GeoPoint, Poi};
use crate::services::geofence;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/pois", get(list_pois).post(create_poi))
        .route(
            "/api/pois/{id}",
            get(get_poi).put(update_poi).delete(delete_poi),
        )
        .route("/api/pois/{id}/distance", get(distance_to_poi))
}

#[derive(Deserialize, Validate)]
pub struct PoiPayload {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub contact: Option<Contact>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: Option<f64>,
    pub image_url: Option<String>,
}

impl PoiPayload {
    fn location(&self) -> Result<Option<GeoPoint>> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Ok(Some(GeoPoint::new(lat, lng))),
            (None, None) => Ok(None),
            _ => Err(AppError::Validation(
                "lat and lng must be provided together".to_string(),
            )),
        }
    }
}

/// List all POIs.
async fn list_pois(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Poi>>> {
    Ok(Json(state.db.list_pois().await?))
}

/// Get one POI.
async fn get_poi(
    State(state): State<Arc<AppState>>,
    Path(poi_id): Path<String>,
) -> Result<Json<Poi>> {
    let poi = state
        .db
        .get_poi(&poi_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("POI {} not found", poi_id)))?;
    Ok(Json(poi))
}

/// Register a new POI (manager only).
async fn create_poi(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<PoiPayload>,
) -> Result<Json<Poi>> {
    user.require_manager()?;
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let poi = Poi {
        id: uuid::Uuid::new_v4().to_string(),
        name: req.name.clone(),
        address: req.address.clone(),
        description: req.description.clone(),
        category: req.category.clone(),
        contact: req.contact.clone(),
        contact_name: None,
        contact_phone: None,
        location: req.location()?,
        image_url: req.image_url.clone(),
        last_visit_at: None,
        last_visit_rep: None,
        last_visit_duration_minutes: None,
    };

    state.db.upsert_poi(&poi).await?;
    tracing::info!(poi_id = %poi.id, name = %poi.name, "POI created");

    Ok(Json(poi))
}

/// Update a POI (manager only). The last-visit summary fields are owned
/// by the checkout path and are preserved here.
async fn update_poi(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(poi_id): Path<String>,
    Json(req): Json<PoiPayload>,
) -> Result<Json<Poi>> {
    user.require_manager()?;
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let mut poi = state
        .db
        .get_poi(&poi_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("POI {} not found", poi_id)))?;

    poi.name = req.name.clone();
    poi.address = req.address.clone();
    poi.description = req.description.clone();
    poi.category = req.category.clone();
    poi.contact = req.contact.clone();
    poi.location = req.location()?;
    poi.image_url = req.image_url.clone();

    state.db.upsert_poi(&poi).await?;

    Ok(Json(poi))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeletePoiResponse {
    pub success: bool,
}

/// Delete a POI (manager only).
async fn delete_poi(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(poi_id): Path<String>,
) -> Result<Json<DeletePoiResponse>> {
    user.require_manager()?;

    state.db.delete_poi(&poi_id).await?;
    tracing::info!(poi_id = %poi_id, "POI deleted");

    Ok(Json(DeletePoiResponse { success: true }))
}

#[derive(Deserialize, Validate)]
struct DistanceQuery {
    #[validate(range(min = -90.0, max = 90.0))]
    lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    lng: f64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DistanceResponse {
    pub distance_m: f64,
    pub within_check_in_range: bool,
}

/// Distance from the given position to the POI, for the "how far away"
/// display. Uses the same formula as check-in admission.
async fn distance_to_poi(
    State(state): State<Arc<AppState>>,
    Path(poi_id): Path<String>,
    Query(query): Query<DistanceQuery>,
) -> Result<Json<DistanceResponse>> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let poi = state
        .db
        .get_poi(&poi_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("POI {} not found", poi_id)))?;

    let location = poi
        .location
        .ok_or_else(|| AppError::Validation(format!("POI '{}' has no coordinate", poi.name)))?;

    let distance_m = geofence::distance_m(GeoPoint::new(query.lat, query.lng), location);

    Ok(Json(DistanceResponse {
        distance_m,
        within_check_in_range: distance_m <= geofence::CHECK_IN_RADIUS_M,
    }))
}
