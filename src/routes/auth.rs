// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password authentication routes.
//!
//! Password verification is delegated to the identity provider; on
//! success we mint a session JWT carrying the user's ID and role, set as
//! an HTTP-only cookie and also returned in the body for mobile clients
//! that prefer the Authorization header.

use axum::{extract::State, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE};
use crate::models::{Role, User};
use crate::services::identity::AuthAccount;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/signup", post(signup))
        .route("/auth/password-reset", post(password_reset))
        .route("/auth/logout", post(logout))
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub display_name: String,
}

#[derive(Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OkResponse {
    pub success: bool,
}

/// Sign in with email and password.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let account = state.identity.sign_in(&req.email, &req.password).await?;
    let user = ensure_user_profile(&state, &account).await?;

    issue_session(&state, jar, user)
}

/// Create an account and sign in.
async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<SignupRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let account = state
        .identity
        .sign_up(&req.email, &req.password, Some(&req.display_name))
        .await?;

    let user = User {
        id: account.local_id.clone(),
        display_name: req.display_name,
        // New accounts start as field reps; role upgrades are an admin
        // operation on the user document.
        role: Role::FieldRep,
        email: account.email.clone(),
        phone: None,
        photo_url: None,
        notifications_enabled: true,
        language: "en".to_string(),
        created_at: format_utc_rfc3339(chrono::Utc::now()),
    };
    state.db.upsert_user(&user).await?;

    tracing::info!(user_id = %user.id, "Account created");

    issue_session(&state, jar, user)
}

/// Send a password-reset email.
async fn password_reset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PasswordResetRequest>,
) -> Result<Json<OkResponse>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    state.identity.send_password_reset(&req.email).await?;

    Ok(Json(OkResponse { success: true }))
}

/// Clear the session cookie.
async fn logout(jar: CookieJar) -> (CookieJar, Json<OkResponse>) {
    let removal = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .build();

    (jar.remove(removal), Json(OkResponse { success: true }))
}

/// Fetch the user profile, creating a default one for accounts that
/// pre-date profile documents.
async fn ensure_user_profile(state: &AppState, account: &AuthAccount) -> Result<User> {
    if let Some(user) = state.db.get_user(&account.local_id).await? {
        return Ok(user);
    }

    let user = User {
        id: account.local_id.clone(),
        display_name: account
            .display_name
            .clone()
            .unwrap_or_else(|| account.email.clone()),
        role: Role::FieldRep,
        email: account.email.clone(),
        phone: None,
        photo_url: None,
        notifications_enabled: true,
        language: "en".to_string(),
        created_at: format_utc_rfc3339(chrono::Utc::now()),
    };
    state.db.upsert_user(&user).await?;

    Ok(user)
}

fn issue_session(
    state: &AppState,
    jar: CookieJar,
    user: User,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let token = create_jwt(&user.id, user.role, &state.config.jwt_signing_key)?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((jar.add(cookie), Json(SessionResponse { token, user })))
}
