// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cloud Storage client for profile photos.
//!
//! Uploads via the GCS JSON API with a bearer token from the instance
//! metadata server (Cloud Run service account), cached until shortly
//! before expiry.

use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::error::{AppError, Result};

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Refresh the token this long before the metadata server says it expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Cloud Storage client.
pub struct StorageService {
    http: reqwest::Client,
    bucket: String,
    token: RwLock<Option<CachedToken>>,
}

impl StorageService {
    pub fn new(bucket: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            bucket: bucket.to_string(),
            token: RwLock::new(None),
        }
    }

    /// Upload an object and return its public URL.
    pub async fn upload(
        &self,
        object_path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let token = self.access_token().await?;

        let url = format!(
            "https://storage.googleapis.com/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.bucket,
            urlencoding::encode(object_path)
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!(
                "Upload rejected ({}): {}",
                status, body
            )));
        }

        tracing::info!(bucket = %self.bucket, object = object_path, "Uploaded object");

        Ok(self.public_url(object_path))
    }

    /// Public URL for an object in the bucket.
    pub fn public_url(&self, object_path: &str) -> String {
        format!(
            "https://storage.googleapis.com/{}/{}",
            self.bucket,
            urlencoding::encode(object_path)
        )
    }

    /// Bearer token from the metadata server, cached until near expiry.
    async fn access_token(&self) -> Result<String> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > Instant::now() {
                    return Ok(token.value.clone());
                }
            }
        }

        let response = self
            .http
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Metadata server unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Storage(format!(
                "Metadata server returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Storage(format!("Malformed token response: {}", e)))?;

        let expires_at = Instant::now()
            + Duration::from_secs(token.expires_in.max(TOKEN_EXPIRY_MARGIN.as_secs()))
            - TOKEN_EXPIRY_MARGIN;

        let mut cached = self.token.write().await;
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at,
        });

        Ok(token.access_token)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_encodes_object_path() {
        let service = StorageService::new("proj.appspot.com");
        let url = service.public_url("profile-photos/user 1.jpg");
        assert_eq!(
            url,
            "https://storage.googleapis.com/proj.appspot.com/profile-photos%2Fuser%201.jpg"
        );
    }
}
