// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use field_tracker::config::Config;
use field_tracker::db::FirestoreDb;
use field_tracker::models::Role;
use field_tracker::routes::create_router;
use field_tracker::services::{GeofencePolicy, IdentityService, StorageService, VisitLifecycle};
use field_tracker::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();
    let lifecycle = VisitLifecycle::new(db.clone(), GeofencePolicy::default());
    let identity = IdentityService::new(&config.identity_api_key);
    let storage = StorageService::new(&config.storage_bucket);

    let state = Arc::new(AppState {
        config,
        db,
        lifecycle,
        identity,
        storage,
    });

    (create_router(state.clone()), state)
}

/// Create a session JWT for tests.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, role: Role, signing_key: &[u8]) -> String {
    field_tracker::middleware::auth::create_jwt(user_id, role, signing_key)
        .expect("Failed to create test JWT")
}
