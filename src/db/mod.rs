//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const POIS: &str = "pois";
    pub const VISITS: &str = "visits";
    /// Immutable checkout snapshots (append-only)
    pub const VISIT_HISTORY: &str = "visit_history";
    /// Live rep status records (keyed by rep ID)
    pub const PRESENCE: &str = "presence";
    pub const TASKS: &str = "tasks";
    /// Per-rep counter aggregates (keyed by rep ID)
    pub const REP_STATS: &str = "rep_stats";
}
