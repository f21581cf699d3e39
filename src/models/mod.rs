// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod geo;
pub mod poi;
pub mod presence;
pub mod stats;
pub mod task;
pub mod user;
pub mod visit;

pub use geo::GeoPoint;
pub use poi::{Contact, Poi, PoiLastVisit};
pub use presence::{Presence, PresenceAvatar, PresenceCheckIn, PresenceCheckOut, PresenceStatus};
pub use stats::RepStats;
pub use task::{Task, TaskPriority, TaskStatus};
pub use user::{Role, User};
pub use visit::{Visit, VisitHistoryRecord, VisitStatus};
