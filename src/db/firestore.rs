// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage)
//! - POIs (locations, with denormalized last-visit summaries)
//! - Visits and visit history (lifecycle records + immutable snapshots)
//! - Presence (live rep status, merge-only writes)
//! - Tasks (plain CRUD)
//! - Rep stats (counter aggregates)
//!
//! The visit lifecycle's multi-collection writes are committed through
//! Firestore transactions so a crash mid-sequence cannot leave the visit,
//! POI summary and presence records disagreeing.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{
    Poi, PoiLastVisit, Presence, PresenceAvatar, PresenceCheckIn, PresenceCheckOut, RepStats, Task,
    User, Visit, VisitHistoryRecord, VisitStatus,
};
use crate::time_utils::{format_utc_rfc3339, DateRange};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user profile by auth-provider local ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user profile.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── POI Operations ──────────────────────────────────────────

    /// Get a POI by ID. The contact shape is normalized before return so
    /// business logic never sees the legacy flat fields.
    pub async fn get_poi(&self, poi_id: &str) -> Result<Option<Poi>, AppError> {
        let poi: Option<Poi> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::POIS)
            .obj()
            .one(poi_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(poi.map(Poi::normalize_contact))
    }

    /// List all POIs, ordered by name.
    pub async fn list_pois(&self) -> Result<Vec<Poi>, AppError> {
        let pois: Vec<Poi> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::POIS)
            .order_by([("name", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(map_query_error)?;

        Ok(pois.into_iter().map(Poi::normalize_contact).collect())
    }

    /// Create or update a POI.
    pub async fn upsert_poi(&self, poi: &Poi) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::POIS)
            .document_id(&poi.id)
            .object(poi)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a POI.
    pub async fn delete_poi(&self, poi_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::POIS)
            .document_id(poi_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Visit Operations ────────────────────────────────────────

    /// Get a visit by ID.
    pub async fn get_visit(&self, visit_id: &str) -> Result<Option<Visit>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::VISITS)
            .obj()
            .one(visit_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a visit.
    pub async fn upsert_visit(&self, visit: &Visit) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::VISITS)
            .document_id(&visit.id)
            .object(visit)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Hard-delete a visit record. Side effects already applied to POI
    /// summaries and history records are NOT retracted.
    pub async fn delete_visit(&self, visit_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::VISITS)
            .document_id(visit_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Query visits with optional rep/status/date-range filters, newest
    /// first. A filter+order combination here may need a composite index;
    /// until it is provisioned the query surfaces `IndexNotReady`.
    pub async fn query_visits(
        &self,
        rep_id: Option<&str>,
        status: Option<VisitStatus>,
        range: Option<DateRange>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Visit>, AppError> {
        let rep_id = rep_id.map(str::to_string);
        let status = status.map(|s| s.as_str().to_string());
        let range_bounds =
            range.map(|r| (format_utc_rfc3339(r.start), format_utc_rfc3339(r.end)));

        self.get_client()?
            .fluent()
            .select()
            .from(collections::VISITS)
            .filter(move |q| {
                q.for_all([
                    rep_id
                        .as_ref()
                        .and_then(|v| q.field("rep_id").eq(v.clone())),
                    status
                        .as_ref()
                        .and_then(|v| q.field("status").eq(v.clone())),
                    range_bounds.as_ref().and_then(|(start, _)| {
                        q.field("visit_date").greater_than_or_equal(start.clone())
                    }),
                    range_bounds
                        .as_ref()
                        .and_then(|(_, end)| q.field("visit_date").less_than(end.clone())),
                ])
            })
            .order_by([("visit_date", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .offset(offset)
            .obj()
            .query()
            .await
            .map_err(map_query_error)
    }

    // ─── Presence Operations ─────────────────────────────────────

    /// Get one rep's presence record.
    pub async fn get_presence(&self, rep_id: &str) -> Result<Option<Presence>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PRESENCE)
            .obj()
            .one(rep_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Merge a rep's avatar URL into their presence record (written when
    /// the profile photo changes).
    pub async fn merge_presence_avatar(
        &self,
        rep_id: &str,
        avatar_url: Option<&str>,
    ) -> Result<(), AppError> {
        let payload = PresenceAvatar {
            avatar_url: avatar_url.map(String::from),
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(firestore::paths!(PresenceAvatar::{avatar_url}))
            .in_col(collections::PRESENCE)
            .document_id(rep_id)
            .object(&payload)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Snapshot of all presence records, for the tracking view.
    pub async fn list_presence(&self) -> Result<Vec<Presence>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::PRESENCE)
            .obj()
            .query()
            .await
            .map_err(map_query_error)
    }

    // ─── Task Operations ─────────────────────────────────────────

    /// Get a task by ID.
    pub async fn get_task(&self, task_id: &str) -> Result<Option<Task>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TASKS)
            .obj()
            .one(task_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List tasks for an owner, optionally restricted to a due-date range,
    /// due-soonest first.
    pub async fn list_tasks_for_owner(
        &self,
        owner_id: &str,
        due_range: Option<DateRange>,
    ) -> Result<Vec<Task>, AppError> {
        let owner_id = owner_id.to_string();
        let range_bounds =
            due_range.map(|r| (format_utc_rfc3339(r.start), format_utc_rfc3339(r.end)));

        self.get_client()?
            .fluent()
            .select()
            .from(collections::TASKS)
            .filter(move |q| {
                q.for_all([
                    q.field("owner_id").eq(owner_id.clone()),
                    range_bounds.as_ref().and_then(|(start, _)| {
                        q.field("due_date").greater_than_or_equal(start.clone())
                    }),
                    range_bounds
                        .as_ref()
                        .and_then(|(_, end)| q.field("due_date").less_than(end.clone())),
                ])
            })
            .order_by([("due_date", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(map_query_error)
    }

    /// Create or update a task.
    pub async fn upsert_task(&self, task: &Task) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TASKS)
            .document_id(&task.id)
            .object(task)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a task.
    pub async fn delete_task(&self, task_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::TASKS)
            .document_id(task_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Rep Stats Operations ────────────────────────────────────

    /// Get a rep's counter aggregate.
    pub async fn get_rep_stats(&self, rep_id: &str) -> Result<Option<RepStats>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::REP_STATS)
            .obj()
            .one(rep_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a rep's counter aggregate.
    pub async fn set_rep_stats(&self, rep_id: &str, stats: &RepStats) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::REP_STATS)
            .document_id(rep_id)
            .object(stats)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Lifecycle Transactions ──────────────────────────────────

    /// Atomically record a check-in: create the visit and merge the rep's
    /// presence in one transaction, so a crash between the two writes
    /// cannot leave presence pointing at a visit that was never created.
    pub async fn commit_check_in(
        &self,
        visit: &Visit,
        presence: &PresenceCheckIn,
    ) -> Result<(), AppError> {
        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::VISITS)
            .document_id(&visit.id)
            .object(visit)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add visit to transaction: {}", e))
            })?;

        self.get_client()?
            .fluent()
            .update()
            .fields(firestore::paths!(PresenceCheckIn::{
                rep_id,
                rep_name,
                status,
                last_check_in_location,
                last_check_in_at,
                current_visit_id,
                current_poi_id
            }))
            .in_col(collections::PRESENCE)
            .document_id(&visit.rep_id)
            .object(presence)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add presence to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            visit_id = %visit.id,
            rep_id = %visit.rep_id,
            "Check-in committed"
        );

        Ok(())
    }

    /// Atomically record a new assignment: write the visit and bump the
    /// assignee's running assigned-visit counter.
    ///
    /// Assignment *edits* go through [`Self::upsert_visit`] instead and
    /// never touch the counter.
    pub async fn commit_assignment(
        &self,
        visit: &Visit,
        assignee_id: &str,
    ) -> Result<(), AppError> {
        let now = format_utc_rfc3339(chrono::Utc::now());

        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // Read current stats within the transaction span; Firestore retries
        // on conflict with fresh data, preventing lost counter updates.
        let mut stats = self.get_rep_stats(assignee_id).await?.unwrap_or_default();
        stats.record_assignment(&now);

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::VISITS)
            .document_id(&visit.id)
            .object(visit)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add visit to transaction: {}", e))
            })?;

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::REP_STATS)
            .document_id(assignee_id)
            .object(&stats)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add stats to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            visit_id = %visit.id,
            assignee_id,
            "Assignment committed"
        );

        Ok(())
    }

    /// Atomically record a checkout.
    ///
    /// One transaction covers: the completed visit, the POI's last-visit
    /// summary (merge, when the visit references a registered POI), the
    /// rep's presence (merge back to available), the immutable history
    /// snapshot, and the rep's completion counters.
    ///
    /// NOT idempotent: calling this twice for the same visit overwrites
    /// timestamps and appends a second history record. Callers own that
    /// behavior.
    pub async fn commit_check_out(
        &self,
        visit: &Visit,
        poi_update: Option<(&str, &PoiLastVisit)>,
        presence: &PresenceCheckOut,
        history_doc_id: &str,
        history: &VisitHistoryRecord,
    ) -> Result<(), AppError> {
        let now = format_utc_rfc3339(chrono::Utc::now());

        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let mut stats = self.get_rep_stats(&visit.rep_id).await?.unwrap_or_default();
        stats.record_completion(visit.duration_minutes.unwrap_or(0), &now);

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::VISITS)
            .document_id(&visit.id)
            .object(visit)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add visit to transaction: {}", e))
            })?;

        if let Some((poi_id, last_visit)) = poi_update {
            self.get_client()?
                .fluent()
                .update()
                .fields(firestore::paths!(PoiLastVisit::{
                    last_visit_at,
                    last_visit_rep,
                    last_visit_duration_minutes
                }))
                .in_col(collections::POIS)
                .document_id(poi_id)
                .object(last_visit)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add POI summary to transaction: {}", e))
                })?;
        }

        self.get_client()?
            .fluent()
            .update()
            .fields(firestore::paths!(PresenceCheckOut::{
                status,
                last_check_out_at,
                current_visit_id,
                current_poi_id
            }))
            .in_col(collections::PRESENCE)
            .document_id(&visit.rep_id)
            .object(presence)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add presence to transaction: {}", e))
            })?;

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::VISIT_HISTORY)
            .document_id(history_doc_id)
            .object(history)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add history to transaction: {}", e))
            })?;

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::REP_STATS)
            .document_id(&visit.rep_id)
            .object(&stats)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add stats to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            visit_id = %visit.id,
            rep_id = %visit.rep_id,
            poi_id = ?visit.poi_id,
            "Checkout committed"
        );

        Ok(())
    }

    /// Visit history for a given visit, oldest first.
    pub async fn get_history_for_visit(
        &self,
        visit_id: &str,
    ) -> Result<Vec<VisitHistoryRecord>, AppError> {
        let visit_id = visit_id.to_string();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::VISIT_HISTORY)
            .filter(move |q| q.for_all([q.field("visit_id").eq(visit_id.clone())]))
            .order_by([(
                "recorded_at",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(map_query_error)
    }
}

/// Convert a query error, distinguishing the "index still provisioning"
/// condition: Firestore rejects filter+order combinations that need a
/// composite index with FAILED_PRECONDITION and embeds the console URL
/// that creates it.
fn map_query_error(e: firestore::errors::FirestoreError) -> AppError {
    let msg = e.to_string();
    if msg.contains("FAILED_PRECONDITION") && msg.to_lowercase().contains("index") {
        AppError::IndexNotReady {
            console_url: extract_console_url(&msg),
        }
    } else {
        AppError::Database(msg)
    }
}

/// Pull the index-creation console URL out of a Firestore error message.
pub fn extract_console_url(msg: &str) -> Option<String> {
    let start = msg.find("https://console.firebase.google.com")?;
    let rest = &msg[start..];
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '"' || c == '\'')
        .unwrap_or(rest.len());
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_console_url() {
        let msg = "status: FAILED_PRECONDITION, message: \"The query requires an index. \
                   You can create it here: https://console.firebase.google.com/project/x/firestore/indexes?create_composite=abc\" extra";
        let url = extract_console_url(msg).unwrap();
        assert!(url.starts_with("https://console.firebase.google.com/project/x"));
        assert!(url.ends_with("create_composite=abc"));
    }

    #[test]
    fn test_extract_console_url_absent() {
        assert!(extract_console_url("status: FAILED_PRECONDITION, requires an index").is_none());
    }
}
