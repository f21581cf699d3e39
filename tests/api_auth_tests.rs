// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and role tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid tokens
//! 2. Expired/garbage tokens are rejected
//! 3. Manager-only routes reject field reps before touching the backend

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use field_tracker::models::Role;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_me_requires_auth() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_visits_require_auth() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/visits")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tracking_requires_auth() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/tracking/presence")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/me")
                .header(header::AUTHORIZATION, "Bearer not.a.jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_wrong_key_rejected() {
    let (app, _) = common::create_test_app();
    let token = common::create_test_jwt("rep-1", Role::FieldRep, b"some_other_signing_key_entirely");

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_field_rep_cannot_delete_visits() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("rep-1", Role::FieldRep, &state.config.jwt_signing_key);

    // Role rejection happens before any backend access, so the offline
    // mock db is never touched.
    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/visits/v1")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_field_rep_cannot_view_tracking() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("rep-1", Role::FieldRep, &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/tracking/presence")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_legacy_role_spelling_in_token_still_works() {
    // Old clients may hold tokens minted with a legacy role spelling;
    // the middleware maps them through the same alias table as storage.
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde::Serialize;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[derive(Serialize)]
    struct LegacyClaims {
        sub: String,
        role: String,
        exp: usize,
        iat: usize,
    }

    let (app, state) = common::create_test_app();

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;
    let claims = LegacyClaims {
        sub: "lead-1".to_string(),
        role: "team-leader".to_string(),
        exp: now + 86400,
        iat: now,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&state.config.jwt_signing_key),
    )
    .unwrap();

    // team-leader maps to manager, so the tracking snapshot is allowed;
    // the offline db then fails with a 500 rather than 401/403.
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/tracking/presence")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
