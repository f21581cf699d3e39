// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod geofence;
pub mod identity;
pub mod storage;
pub mod visit;

pub use geofence::GeofencePolicy;
pub use identity::{AuthAccount, IdentityService};
pub use storage::StorageService;
pub use visit::{AssignVisitParams, VisitLifecycle};
