// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile routes: current user, preference edits, photo upload.

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::User;
use crate::AppState;

/// Photo uploads are capped at 5 MB of decoded bytes.
const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).put(update_me))
        .route("/api/me/photo", post(upload_photo))
}

/// Get the current user's profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>> {
    let profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(profile))
}

#[derive(Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    pub notifications_enabled: Option<bool>,
    #[validate(length(min = 2, max = 10))]
    pub language: Option<String>,
}

/// Update profile fields. Role changes are not accepted here; they are
/// an admin operation on the user document.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<User>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let mut profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    if let Some(display_name) = req.display_name {
        profile.display_name = display_name;
    }
    if let Some(phone) = req.phone {
        profile.phone = Some(phone);
    }
    if let Some(notifications_enabled) = req.notifications_enabled {
        profile.notifications_enabled = notifications_enabled;
    }
    if let Some(language) = req.language {
        profile.language = language;
    }

    state.db.upsert_user(&profile).await?;

    Ok(Json(profile))
}

#[derive(Deserialize, Validate)]
pub struct PhotoUploadRequest {
    /// Base64-encoded image bytes
    #[validate(length(min = 1))]
    pub data_base64: String,
    /// "image/jpeg" or "image/png"
    pub content_type: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PhotoUploadResponse {
    pub photo_url: String,
}

/// Upload a profile photo to Cloud Storage and store its public URL on
/// the user document.
async fn upload_photo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<PhotoUploadRequest>,
) -> Result<Json<PhotoUploadResponse>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let extension = match req.content_type.as_str() {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        other => {
            return Err(AppError::Validation(format!(
                "Unsupported content type '{}'",
                other
            )))
        }
    };

    let bytes = STANDARD
        .decode(&req.data_base64)
        .map_err(|_| AppError::Validation("data_base64 is not valid base64".to_string()))?;

    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(AppError::Validation(format!(
            "Photo exceeds the {} MB limit",
            MAX_PHOTO_BYTES / (1024 * 1024)
        )));
    }

    let mut profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    let object_path = format!("profile-photos/{}.{}", user.user_id, extension);
    let photo_url = state
        .storage
        .upload(&object_path, bytes, &req.content_type)
        .await?;

    profile.photo_url = Some(photo_url.clone());
    state.db.upsert_user(&profile).await?;

    // Keep the tracking map's avatar in sync. Best-effort: presence is a
    // cache, so a failure here does not fail the upload.
    if let Err(e) = state
        .db
        .merge_presence_avatar(&user.user_id, Some(&photo_url))
        .await
    {
        tracing::warn!(error = %e, user_id = %user.user_id, "Presence avatar merge failed");
    }

    Ok(Json(PhotoUploadResponse { photo_url }))
}
