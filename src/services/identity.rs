// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Identity Toolkit client (email/password auth provider).
//!
//! The API itself owns password verification; this service only maps
//! provider error codes into our taxonomy and throttles repeated
//! failures per email within this instance.

use dashmap::DashMap;
use serde::Deserialize;
use std::time::{Duration, Instant};

use crate::error::{AppError, Result};

const IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Failed sign-ins allowed per email before the throttle kicks in.
const MAX_FAILED_ATTEMPTS: u32 = 5;
/// Throttle window.
const THROTTLE_WINDOW: Duration = Duration::from_secs(15 * 60);

/// An authenticated account as the provider reports it.
#[derive(Debug, Clone)]
pub struct AuthAccount {
    /// Provider-local user ID (our user document ID)
    pub local_id: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Identity Toolkit REST client.
pub struct IdentityService {
    http: reqwest::Client,
    api_key: String,
    /// Per-email failure counter, shared across requests in this instance
    failures: DashMap<String, (u32, Instant)>,
}

impl IdentityService {
    pub fn new(api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
            failures: DashMap::new(),
        }
    }

    /// Sign in with email and password.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthAccount> {
        self.check_throttle(email)?;

        let url = format!(
            "{}/accounts:signInWithPassword?key={}",
            IDENTITY_BASE_URL, self.api_key
        );
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });

        let result = self.post_account_request(&url, &body).await;
        match &result {
            Err(AppError::Unauthorized) | Err(AppError::UnknownAccount) => {
                self.record_failure(email);
            }
            Ok(_) => {
                self.failures.remove(email);
            }
            Err(_) => {}
        }
        result
    }

    /// Create a new account.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthAccount> {
        let url = format!("{}/accounts:signUp?key={}", IDENTITY_BASE_URL, self.api_key);
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "displayName": display_name,
            "returnSecureToken": true,
        });

        self.post_account_request(&url, &body).await
    }

    /// Send a password-reset email.
    pub async fn send_password_reset(&self, email: &str) -> Result<()> {
        let url = format!(
            "{}/accounts:sendOobCode?key={}",
            IDENTITY_BASE_URL, self.api_key
        );
        let body = serde_json::json!({
            "requestType": "PASSWORD_RESET",
            "email": email,
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Identity(format!("Request failed: {}", e)))?;

        if response.status().is_success() {
            return Ok(());
        }

        let error_body: ProviderErrorBody = response
            .json()
            .await
            .map_err(|e| AppError::Identity(format!("Malformed error response: {}", e)))?;
        Err(map_provider_error(&error_body.error.message))
    }

    async fn post_account_request(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<AuthAccount> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Identity(format!("Request failed: {}", e)))?;

        if response.status().is_success() {
            let account: AccountResponse = response
                .json()
                .await
                .map_err(|e| AppError::Identity(format!("Malformed response: {}", e)))?;
            return Ok(AuthAccount {
                local_id: account.local_id,
                email: account.email,
                display_name: account.display_name,
            });
        }

        let error_body: ProviderErrorBody = response
            .json()
            .await
            .map_err(|e| AppError::Identity(format!("Malformed error response: {}", e)))?;
        Err(map_provider_error(&error_body.error.message))
    }

    fn check_throttle(&self, email: &str) -> Result<()> {
        if let Some(entry) = self.failures.get(email) {
            let (count, since) = *entry;
            if count >= MAX_FAILED_ATTEMPTS && since.elapsed() < THROTTLE_WINDOW {
                return Err(AppError::Forbidden(
                    "Too many failed sign-in attempts; try again later".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn record_failure(&self, email: &str) {
        let mut entry = self
            .failures
            .entry(email.to_string())
            .or_insert((0, Instant::now()));
        if entry.1.elapsed() >= THROTTLE_WINDOW {
            *entry = (1, Instant::now());
        } else {
            entry.0 += 1;
        }
    }
}

#[derive(Deserialize)]
struct AccountResponse {
    #[serde(rename = "localId")]
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Deserialize)]
struct ProviderError {
    #[serde(default)]
    message: String,
}

/// Map Identity Toolkit error codes into our taxonomy. `EMAIL_NOT_FOUND`
/// gets its own variant so clients can offer "Sign up instead".
fn map_provider_error(code: &str) -> AppError {
    let code = code.split(':').next().unwrap_or(code).trim();
    match code {
        "EMAIL_NOT_FOUND" => AppError::UnknownAccount,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
            AppError::Unauthorized
        }
        "EMAIL_EXISTS" => AppError::Validation("email is already registered".to_string()),
        "WEAK_PASSWORD" => {
            AppError::Validation("password must be at least 6 characters".to_string())
        }
        "INVALID_EMAIL" => AppError::Validation("email is not valid".to_string()),
        other => AppError::Identity(format!("Provider error: {}", other)),
    }
}
