// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Field-Tracker: visit tracking backend for field sales reps
//!
//! This crate provides the backend API for the field-visit application:
//! geofenced check-ins at POIs, manager assignments, checkouts with
//! denormalized POI/presence/history writes, tasks, and the live
//! tracking view.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{IdentityService, StorageService, VisitLifecycle};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub lifecycle: VisitLifecycle,
    pub identity: IdentityService,
    pub storage: StorageService,
}
