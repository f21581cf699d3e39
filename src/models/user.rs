//! User profile model and the closed role enumeration.

use serde::{Deserialize, Serialize};

/// User role.
///
/// The role vocabulary used to be inconsistent across clients
/// (`team-leader` vs `manager`, `field-staff`/`field-worker` vs
/// `field-rep`). This enum is the closed set; the legacy spellings are
/// accepted on read only and every write emits the canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Admin,
    #[serde(alias = "team-leader")]
    Manager,
    #[serde(alias = "field-staff", alias = "field-worker")]
    FieldRep,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::FieldRep => "field-rep",
        }
    }

    /// Parse a canonical or legacy role spelling.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "manager" | "team-leader" => Some(Role::Manager),
            "field-rep" | "field-staff" | "field-worker" => Some(Role::FieldRep),
            _ => None,
        }
    }

    /// Managers and admins may assign visits, mutate POIs and delete
    /// visit records.
    pub fn is_manager(self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

/// User profile stored in Firestore (doc ID = auth provider local ID).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub role: Role,
    pub email: String,
    pub phone: Option<String>,
    /// Public URL of the profile photo in Cloud Storage
    pub photo_url: Option<String>,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    #[serde(default = "default_language")]
    pub language: String,
    pub created_at: String,
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "en".to_string()
}
