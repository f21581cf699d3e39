// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! POI (point of interest) model: pharmacies, clinics and hospitals.

use serde::{Deserialize, Serialize};

use crate::models::geo::GeoPoint;

/// Canonical contact shape.
///
/// Older documents stored the contact as two flat fields
/// (`contact_name`/`contact_phone`); the db layer folds those into this
/// struct before anything else sees the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Stored POI record in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poi {
    /// Document ID (UUID v4)
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub description: Option<String>,
    /// "pharmacy", "hospital", "clinic"
    pub category: Option<String>,
    pub contact: Option<Contact>,
    /// Legacy flat contact fields; read-only, never written back
    #[serde(default, skip_serializing)]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing)]
    pub contact_phone: Option<String>,
    pub location: Option<GeoPoint>,
    pub image_url: Option<String>,
    /// Denormalized summary of the most recently checked-out visit.
    /// Overwritten (not appended) on every checkout; concurrent checkouts
    /// race and the last write wins.
    pub last_visit_at: Option<String>,
    pub last_visit_rep: Option<String>,
    pub last_visit_duration_minutes: Option<i64>,
}

impl Poi {
    /// Fold legacy flat contact fields into the canonical nested shape.
    /// A nested `contact` always wins over the flat pair.
    pub fn normalize_contact(mut self) -> Self {
        if self.contact.is_none() && (self.contact_name.is_some() || self.contact_phone.is_some()) {
            self.contact = Some(Contact {
                name: self.contact_name.take(),
                phone: self.contact_phone.take(),
            });
        }
        self.contact_name = None;
        self.contact_phone = None;
        self
    }
}

/// Merge payload for the POI last-visit summary, written with a field
/// mask so the rest of the POI document survives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoiLastVisit {
    pub last_visit_at: String,
    pub last_visit_rep: String,
    pub last_visit_duration_minutes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poi_json(contact_part: &str) -> String {
        format!(
            r#"{{"id":"p1","name":"Central Pharmacy","address":null,"description":null,
                "category":"pharmacy",{contact_part},"location":{{"lat":9.0,"lng":38.7}},
                "image_url":null,"last_visit_at":null,"last_visit_rep":null,
                "last_visit_duration_minutes":null}}"#
        )
    }

    #[test]
    fn test_flat_contact_is_normalized() {
        let json = poi_json(r#""contact":null,"contact_name":"Abel","contact_phone":"0911""#);
        let poi: Poi = serde_json::from_str(&json).unwrap();
        let poi = poi.normalize_contact();

        let contact = poi.contact.expect("contact should be folded");
        assert_eq!(contact.name.as_deref(), Some("Abel"));
        assert_eq!(contact.phone.as_deref(), Some("0911"));
        assert!(poi.contact_name.is_none());
    }

    #[test]
    fn test_nested_contact_wins_over_flat_pair() {
        let json = poi_json(
            r#""contact":{"name":"Sara","phone":"0922"},"contact_name":"Old","contact_phone":"0911""#,
        );
        let poi: Poi = serde_json::from_str::<Poi>(&json).unwrap().normalize_contact();

        assert_eq!(poi.contact.unwrap().name.as_deref(), Some("Sara"));
        assert!(poi.contact_name.is_none());
    }

    #[test]
    fn test_legacy_fields_never_serialized() {
        let json = poi_json(r#""contact":null,"contact_name":"Abel","contact_phone":"0911""#);
        let poi: Poi = serde_json::from_str::<Poi>(&json).unwrap().normalize_contact();

        let out = serde_json::to_string(&poi).unwrap();
        assert!(!out.contains("contact_name"));
        assert!(!out.contains("contact_phone"));
    }

    #[test]
    fn test_missing_contact_stays_none() {
        let json = poi_json(r#""contact":null"#);
        let poi: Poi = serde_json::from_str::<Poi>(&json).unwrap().normalize_contact();
        assert!(poi.contact.is_none());
    }
}
