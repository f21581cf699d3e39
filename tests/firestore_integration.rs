// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (FIRESTORE_EMULATOR_HOST set). The emulator provides a clean state
//! for each test run.

use field_tracker::models::{
    Contact, GeoPoint, Poi, Presence, PresenceCheckIn, PresenceStatus, Role, User, Visit,
    VisitHistoryRecord, VisitStatus,
};

mod common;
use common::test_db;

/// Generate a unique ID suffix for test isolation.
fn unique_id(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

fn test_user(id: &str) -> User {
    User {
        id: id.to_string(),
        display_name: "Test Rep".to_string(),
        role: Role::FieldRep,
        email: "rep@example.com".to_string(),
        phone: None,
        photo_url: None,
        notifications_enabled: true,
        language: "en".to_string(),
        created_at: "2026-08-05T10:00:00Z".to_string(),
    }
}

fn test_visit(id: &str, rep_id: &str, poi_id: Option<&str>) -> Visit {
    Visit {
        id: id.to_string(),
        rep_id: rep_id.to_string(),
        rep_name: "Test Rep".to_string(),
        poi_id: poi_id.map(String::from),
        poi_name: "Central Pharmacy".to_string(),
        poi_address: None,
        poi_contact: None,
        status: VisitStatus::CheckedIn,
        check_in_time: Some("2026-08-05T10:00:00Z".to_string()),
        check_out_time: None,
        duration_seconds: None,
        duration_minutes: None,
        notes: None,
        completion_notes: None,
        product_interests: vec![],
        familiar_with_product: None,
        interested: None,
        check_in_location: Some(GeoPoint::new(9.005401, 38.763611)),
        assigned_worker_id: None,
        assigned_worker_name: None,
        visit_date: "2026-08-05T10:00:00Z".to_string(),
    }
}

#[tokio::test]
async fn test_user_round_trip() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_id("user");

    assert!(db.get_user(&user_id).await.unwrap().is_none());

    db.upsert_user(&test_user(&user_id)).await.unwrap();

    let fetched = db.get_user(&user_id).await.unwrap().expect("user exists");
    assert_eq!(fetched.display_name, "Test Rep");
    assert_eq!(fetched.role, Role::FieldRep);
}

#[tokio::test]
async fn test_poi_contact_normalized_on_read() {
    require_emulator!();

    let db = test_db().await;
    let poi_id = unique_id("poi");

    let poi = Poi {
        id: poi_id.clone(),
        name: "Legacy Clinic".to_string(),
        address: None,
        description: None,
        category: Some("clinic".to_string()),
        contact: Some(Contact {
            name: Some("Abel".to_string()),
            phone: Some("0911".to_string()),
        }),
        contact_name: None,
        contact_phone: None,
        location: Some(GeoPoint::new(9.01, 38.76)),
        image_url: None,
        last_visit_at: None,
        last_visit_rep: None,
        last_visit_duration_minutes: None,
    };
    db.upsert_poi(&poi).await.unwrap();

    let fetched = db.get_poi(&poi_id).await.unwrap().expect("poi exists");
    let contact = fetched.contact.expect("contact normalized");
    assert_eq!(contact.name.as_deref(), Some("Abel"));
    assert!(fetched.contact_name.is_none());
}

#[tokio::test]
async fn test_check_in_transaction_writes_visit_and_presence() {
    require_emulator!();

    let db = test_db().await;
    let rep_id = unique_id("rep");
    let visit = test_visit(&unique_id("visit"), &rep_id, None);

    let presence = PresenceCheckIn {
        rep_id: rep_id.clone(),
        rep_name: "Test Rep".to_string(),
        status: vec![PresenceStatus::CheckedIn],
        last_check_in_location: GeoPoint::new(9.005401, 38.763611),
        last_check_in_at: "2026-08-05T10:00:00Z".to_string(),
        current_visit_id: visit.id.clone(),
        current_poi_id: None,
    };

    db.commit_check_in(&visit, &presence).await.unwrap();

    let stored = db.get_visit(&visit.id).await.unwrap().expect("visit exists");
    assert_eq!(stored.status, VisitStatus::CheckedIn);

    let stored_presence: Presence = db
        .get_presence(&rep_id)
        .await
        .unwrap()
        .expect("presence exists");
    assert_eq!(stored_presence.status, vec![PresenceStatus::CheckedIn]);
    assert_eq!(stored_presence.current_visit_id, Some(visit.id));
}

#[tokio::test]
async fn test_presence_merge_preserves_unlisted_fields() {
    require_emulator!();

    let db = test_db().await;
    let rep_id = unique_id("rep");

    // Seed the avatar through the same merge the photo upload uses.
    db.merge_presence_avatar(&rep_id, Some("https://example.com/avatar.jpg"))
        .await
        .unwrap();

    let visit = test_visit(&unique_id("visit"), &rep_id, None);
    let presence = PresenceCheckIn {
        rep_id: rep_id.clone(),
        rep_name: "Test Rep".to_string(),
        status: vec![PresenceStatus::CheckedIn],
        last_check_in_location: GeoPoint::new(9.005401, 38.763611),
        last_check_in_at: "2026-08-05T10:00:00Z".to_string(),
        current_visit_id: visit.id.clone(),
        current_poi_id: None,
    };
    db.commit_check_in(&visit, &presence).await.unwrap();

    // The merge payload never mentions avatar_url, so it must survive.
    let merged = db
        .get_presence(&rep_id)
        .await
        .unwrap()
        .expect("presence exists");
    assert_eq!(
        merged.avatar_url.as_deref(),
        Some("https://example.com/avatar.jpg")
    );
    assert_eq!(merged.status, vec![PresenceStatus::CheckedIn]);
}

#[tokio::test]
async fn test_checkout_transaction_appends_exactly_one_history_record() {
    require_emulator!();

    let db = test_db().await;
    let rep_id = unique_id("rep");
    let mut visit = test_visit(&unique_id("visit"), &rep_id, None);
    visit.status = VisitStatus::Completed;
    visit.check_out_time = Some("2026-08-05T10:37:00Z".to_string());
    visit.duration_minutes = Some(37);

    let history = VisitHistoryRecord {
        visit_id: visit.id.clone(),
        recorded_at: "2026-08-05T10:37:00Z".to_string(),
        visit: visit.clone(),
    };
    let history_doc_id = format!("{}_1754390220", visit.id);

    let presence = field_tracker::models::PresenceCheckOut {
        status: vec![PresenceStatus::Available],
        last_check_out_at: "2026-08-05T10:37:00Z".to_string(),
        current_visit_id: None,
        current_poi_id: None,
    };

    db.commit_check_out(&visit, None, &presence, &history_doc_id, &history)
        .await
        .unwrap();

    let records = db.get_history_for_visit(&visit.id).await.unwrap();
    assert_eq!(records.len(), 1);
    // The snapshot carries the same final field values as the visit.
    assert_eq!(records[0].visit, visit);

    let stats = db
        .get_rep_stats(&rep_id)
        .await
        .unwrap()
        .expect("stats exist");
    assert_eq!(stats.completed_visit_count, 1);
    assert_eq!(stats.total_duration_minutes, 37);
}
