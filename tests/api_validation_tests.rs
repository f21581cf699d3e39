// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests.
//!
//! The test app uses the offline mock database, so any request that is
//! rejected with 400 provably performed zero backend reads or writes
//! (touching the mock yields a 500).

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use field_tracker::models::Role;
use tower::ServiceExt;

mod common;

fn json_request(method: &str, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_assign_rejected_while_familiar_flag_unset() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("mgr-1", Role::Manager, &state.config.jwt_signing_key);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/visits/assign",
            &token,
            serde_json::json!({
                "poi_id": "p1",
                "assignee_id": "rep-1",
                "interested": true
            }),
        ))
        .await
        .unwrap();

    // 400, not 500: rejected before the (offline) backend was touched.
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_assign_rejected_while_interested_flag_unset() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("mgr-1", Role::Manager, &state.config.jwt_signing_key);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/visits/assign",
            &token,
            serde_json::json!({
                "poi_id": "p1",
                "assignee_id": "rep-1",
                "familiar_with_product": false
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_assign_requires_manager_role() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("rep-1", Role::FieldRep, &state.config.jwt_signing_key);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/visits/assign",
            &token,
            serde_json::json!({
                "poi_id": "p1",
                "assignee_id": "rep-2",
                "familiar_with_product": true,
                "interested": true
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_check_in_rejects_out_of_range_latitude() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("rep-1", Role::FieldRep, &state.config.jwt_signing_key);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/visits/check-in",
            &token,
            serde_json::json!({
                "poi_id": "p1",
                "lat": 123.0,
                "lng": 38.76
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_visits_list_rejects_unknown_bucket() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("rep-1", Role::FieldRep, &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/visits?bucket=fortnight")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_visits_list_rejects_unknown_status() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("rep-1", Role::FieldRep, &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/visits?status=paused")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_visits_list_rejects_oversized_page() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("rep-1", Role::FieldRep, &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/visits?per_page=500")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_photo_upload_rejects_unsupported_content_type() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("rep-1", Role::FieldRep, &state.config.jwt_signing_key);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/me/photo",
            &token,
            serde_json::json!({
                "data_base64": "aGVsbG8=",
                "content_type": "image/gif"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_photo_upload_rejects_invalid_base64() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("rep-1", Role::FieldRep, &state.config.jwt_signing_key);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/me/photo",
            &token,
            serde_json::json!({
                "data_base64": "!!!not base64!!!",
                "content_type": "image/jpeg"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_task_creation_rejects_bad_due_date() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("rep-1", Role::FieldRep, &state.config.jwt_signing_key);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/tasks",
            &token,
            serde_json::json!({
                "title": "Restock samples",
                "due_date": "next tuesday"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_task_list_rejects_unknown_week_filter() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("rep-1", Role::FieldRep, &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/tasks?week=rolling")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_rejects_malformed_email() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({"email": "not-an-email", "password": "secret"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
