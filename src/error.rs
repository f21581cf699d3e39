// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or invalid user input; the message names the field.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Check-in rejected by the geofence; carries the measured distance.
    #[error("Too far from POI: {distance_m} m (limit {max_m} m)")]
    TooFar { distance_m: f64, max_m: f64 },

    /// No account exists for the given email. Surfaced with a sign-up
    /// affordance instead of a generic auth failure.
    #[error("No account for that email")]
    UnknownAccount,

    /// A query hit a Firestore index that is still being provisioned.
    /// Transient: retryable by the user, with a direct remediation link.
    #[error("Backend index not ready")]
    IndexNotReady { console_url: Option<String> },

    #[error("Identity provider error: {0}")]
    Identity(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    /// Remediation hint for the client ("retry", "sign_up", "create_index")
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details, action) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None, None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None, None),
            AppError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, "forbidden", Some(msg.clone()), None)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone()), None),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()), None)
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                Some(msg.clone()),
                None,
            ),
            AppError::TooFar { distance_m, max_m } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "too_far",
                Some(format!(
                    "You are {:.0} m from the POI; check-in requires being within {:.0} m",
                    distance_m, max_m
                )),
                None,
            ),
            AppError::UnknownAccount => (
                StatusCode::UNAUTHORIZED,
                "unknown_account",
                Some("No account exists for that email".to_string()),
                Some("sign_up".to_string()),
            ),
            AppError::IndexNotReady { console_url } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "index_not_ready",
                console_url.clone().or_else(|| {
                    Some("The backend is still provisioning an index; retry shortly".to_string())
                }),
                Some("create_index".to_string()),
            ),
            AppError::Identity(msg) => {
                tracing::error!(error = %msg, "Identity provider error");
                (StatusCode::BAD_GATEWAY, "identity_error", None, None)
            }
            AppError::Storage(msg) => {
                tracing::error!(error = %msg, "Storage error");
                (StatusCode::BAD_GATEWAY, "storage_error", None, None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None, None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None, None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
            action,
        };

        (status, Json(body)).into_response()
    }
}

impl AppError {
    /// Whether a client-initiated retry of the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::IndexNotReady { .. })
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
