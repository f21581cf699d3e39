// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Field-Tracker API Server
//!
//! Backend for the field-visit application: reps check in at POIs under
//! a geofence, log notes and product interest, managers assign visits
//! and tasks, and the tracking view streams rep presence.

use field_tracker::{
    config::Config,
    db::FirestoreDb,
    services::{GeofencePolicy, IdentityService, StorageService, VisitLifecycle},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Field-Tracker API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Visit lifecycle with the default 200 m check-in geofence
    let lifecycle = VisitLifecycle::new(db.clone(), GeofencePolicy::default());

    // Identity Toolkit client (email/password auth)
    let identity = IdentityService::new(&config.identity_api_key);
    tracing::info!("Identity service initialized");

    // Cloud Storage client for profile photos
    let storage = StorageService::new(&config.storage_bucket);
    tracing::info!(bucket = %config.storage_bucket, "Storage service initialized");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        lifecycle,
        identity,
        storage,
    });

    // Build router
    let app = field_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("field_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
