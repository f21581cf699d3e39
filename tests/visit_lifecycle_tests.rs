// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Visit lifecycle tests against the offline mock database.
//!
//! Preconditions must fire before any backend access: with the mock db,
//! an operation that validates correctly returns its domain error, while
//! one that reaches the backend surfaces a database error instead.

use field_tracker::error::AppError;
use field_tracker::models::{GeoPoint, Poi, Role};
use field_tracker::services::{AssignVisitParams, GeofencePolicy, VisitLifecycle};

mod common;

fn lifecycle() -> VisitLifecycle {
    VisitLifecycle::new(common::test_db_offline(), GeofencePolicy::default())
}

fn make_poi(location: Option<GeoPoint>) -> Poi {
    Poi {
        id: "p1".to_string(),
        name: "Central Pharmacy".to_string(),
        address: Some("Bole Road".to_string()),
        description: None,
        category: Some("pharmacy".to_string()),
        contact: None,
        contact_name: None,
        contact_phone: None,
        location,
        image_url: None,
        last_visit_at: None,
        last_visit_rep: None,
        last_visit_duration_minutes: None,
    }
}

#[tokio::test]
async fn test_check_in_rejected_beyond_geofence() {
    let lifecycle = lifecycle();
    let poi = make_poi(Some(GeoPoint::new(9.005401, 38.763611)));
    // ~250 m north of the POI
    let rep_position = GeoPoint::new(9.007650, 38.763611);

    let result = lifecycle
        .check_in("rep-1", "Abel", &poi, rep_position)
        .await;

    match result {
        Err(AppError::TooFar { distance_m, max_m }) => {
            assert!(distance_m > 200.0);
            assert_eq!(max_m, 200.0);
        }
        other => panic!("expected TooFar, got {:?}", other.map(|v| v.id)),
    }
}

#[tokio::test]
async fn test_check_in_within_geofence_reaches_backend() {
    let lifecycle = lifecycle();
    let poi = make_poi(Some(GeoPoint::new(9.005401, 38.763611)));
    // ~150 m north of the POI: admitted, so the commit hits the
    // (offline) backend and fails there rather than at the geofence.
    let rep_position = GeoPoint::new(9.006750, 38.763611);

    let result = lifecycle
        .check_in("rep-1", "Abel", &poi, rep_position)
        .await;

    assert!(matches!(result, Err(AppError::Database(_))));
}

#[tokio::test]
async fn test_check_in_requires_poi_coordinate() {
    let lifecycle = lifecycle();
    let poi = make_poi(None);

    let result = lifecycle
        .check_in("rep-1", "Abel", &poi, GeoPoint::new(9.0, 38.7))
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_assign_validates_before_any_backend_access() {
    let lifecycle = lifecycle();
    let mut poi = make_poi(Some(GeoPoint::new(9.0, 38.7)));
    poi.contact = Some(field_tracker::models::Contact {
        name: Some("Abel".to_string()),
        phone: Some("0911".to_string()),
    });

    let result = lifecycle
        .assign(AssignVisitParams {
            existing_visit_id: None,
            poi,
            assignee_id: "rep-1".to_string(),
            assignee_name: "Sara".to_string(),
            visit_date: None,
            notes: None,
            product_interests: vec![],
            familiar_with_product: Some(true),
            interested: None,
        })
        .await;

    // Validation error, not Database: nothing was read or written.
    match result {
        Err(AppError::Validation(msg)) => assert!(msg.contains("interested")),
        other => panic!("expected Validation, got {:?}", other.map(|v| v.id)),
    }
}

#[tokio::test]
async fn test_assign_without_contact_is_rejected() {
    let lifecycle = lifecycle();
    let poi = make_poi(Some(GeoPoint::new(9.0, 38.7)));

    let result = lifecycle
        .assign(AssignVisitParams {
            existing_visit_id: None,
            poi,
            assignee_id: "rep-1".to_string(),
            assignee_name: "Sara".to_string(),
            visit_date: None,
            notes: None,
            product_interests: vec![],
            familiar_with_product: Some(true),
            interested: Some(false),
        })
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_complete_assigned_requires_notes_before_lookup() {
    let lifecycle = lifecycle();

    let result = lifecycle.complete_assigned("v1", "rep-1", "   ").await;

    // Empty notes are rejected before the visit is even fetched.
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_cancel_unknown_visit_hits_backend() {
    let lifecycle = lifecycle();

    let result = lifecycle.cancel("v1", "rep-1", Role::FieldRep).await;

    assert!(matches!(result, Err(AppError::Database(_))));
}
