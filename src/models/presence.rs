// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Representative presence: the live record of each rep's field status.
//!
//! Presence is a best-effort cache read by the tracking map, never a
//! source of truth. All writes use field-masked merges so fields absent
//! from a payload survive.

use serde::{Deserialize, Serialize};

use crate::models::geo::GeoPoint;

/// One entry in the presence status list. An empty list means offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresenceStatus {
    Available,
    CheckedIn,
    Moving,
    Idle,
}

/// Stored presence record, one per representative (doc ID = rep ID).
///
/// `rep_id` is also written as a field at check-in; records created by
/// other merge paths may not carry it yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presence {
    #[serde(default)]
    pub rep_id: String,
    pub rep_name: Option<String>,
    #[serde(default)]
    pub status: Vec<PresenceStatus>,
    pub avatar_url: Option<String>,
    pub last_check_in_location: Option<GeoPoint>,
    pub last_check_in_at: Option<String>,
    pub last_check_out_at: Option<String>,
    /// Visit/POI the rep is currently at, cleared on checkout
    pub current_visit_id: Option<String>,
    pub current_poi_id: Option<String>,
}

/// Merge payload written at check-in. Only these fields are masked into
/// the document; everything else (avatar, last checkout, ...) survives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceCheckIn {
    pub rep_id: String,
    pub rep_name: String,
    pub status: Vec<PresenceStatus>,
    pub last_check_in_location: GeoPoint,
    pub last_check_in_at: String,
    pub current_visit_id: String,
    pub current_poi_id: Option<String>,
}

/// Merge payload written at checkout. Clears the current visit/POI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceCheckOut {
    pub status: Vec<PresenceStatus>,
    pub last_check_out_at: String,
    pub current_visit_id: Option<String>,
    pub current_poi_id: Option<String>,
}

/// Merge payload written when a rep's profile photo changes, so the
/// tracking map picks up the new avatar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceAvatar {
    pub avatar_url: Option<String>,
}
