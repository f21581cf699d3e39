// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Task routes. Plain CRUD with no cross-collection side effects.

use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Extension, Json, Router,
};
use chrono::{FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Task, TaskPriority, TaskStatus};
use crate::time_utils::{self, format_utc_rfc3339};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", put(update_task).delete(delete_task))
}

#[derive(Deserialize)]
struct TasksQuery {
    /// "calendar" restricts to the Sunday-anchored current week. This is
    /// the task list's week definition; the visit screens use a rolling
    /// week instead.
    week: Option<String>,
    #[serde(default)]
    utc_offset_minutes: i32,
}

/// List the caller's tasks, due-soonest first.
async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<TasksQuery>,
) -> Result<Json<Vec<Task>>> {
    let due_range = match query.week.as_deref() {
        None => None,
        Some("calendar") => {
            let offset = FixedOffset::east_opt(query.utc_offset_minutes * 60)
                .ok_or_else(|| AppError::BadRequest("Invalid utc_offset_minutes".to_string()))?;
            Some(time_utils::calendar_week_range(Utc::now().with_timezone(&offset)))
        }
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "Unknown week filter '{}' (expected calendar)",
                other
            )))
        }
    };

    let tasks = state
        .db
        .list_tasks_for_owner(&user.user_id, due_range)
        .await?;

    Ok(Json(tasks))
}

#[derive(Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// RFC3339
    pub due_date: Option<String>,
    pub priority: Option<TaskPriority>,
}

/// Create a task owned by the caller.
async fn create_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<Json<Task>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    validate_due_date(req.due_date.as_deref())?;

    let now = format_utc_rfc3339(Utc::now());
    let task = Task {
        id: uuid::Uuid::new_v4().to_string(),
        title: req.title,
        description: req.description,
        due_date: req.due_date,
        status: TaskStatus::Pending,
        priority: req.priority.unwrap_or(TaskPriority::Pending),
        owner_id: user.user_id.clone(),
        created_at: now.clone(),
        updated_at: now,
    };

    state.db.upsert_task(&task).await?;

    Ok(Json(task))
}

#[derive(Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

/// Update a task (owner only).
async fn update_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Task>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    validate_due_date(req.due_date.as_deref())?;

    let mut task = load_owned_task(&state, &user, &task_id).await?;

    if let Some(title) = req.title {
        task.title = title;
    }
    if let Some(description) = req.description {
        task.description = Some(description);
    }
    if let Some(due_date) = req.due_date {
        task.due_date = Some(due_date);
    }
    if let Some(status) = req.status {
        task.status = status;
    }
    if let Some(priority) = req.priority {
        task.priority = priority;
    }
    task.updated_at = format_utc_rfc3339(Utc::now());

    state.db.upsert_task(&task).await?;

    Ok(Json(task))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteTaskResponse {
    pub success: bool,
}

/// Delete a task (owner only).
async fn delete_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<String>,
) -> Result<Json<DeleteTaskResponse>> {
    load_owned_task(&state, &user, &task_id).await?;
    state.db.delete_task(&task_id).await?;

    Ok(Json(DeleteTaskResponse { success: true }))
}

fn validate_due_date(raw: Option<&str>) -> Result<()> {
    if let Some(raw) = raw {
        if time_utils::parse_rfc3339(raw).is_none() {
            return Err(AppError::Validation(
                "due_date must be an RFC3339 datetime".to_string(),
            ));
        }
    }
    Ok(())
}

async fn load_owned_task(state: &AppState, user: &AuthUser, task_id: &str) -> Result<Task> {
    let task = state
        .db
        .get_task(task_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task {} not found", task_id)))?;

    if task.owner_id != user.user_id {
        return Err(AppError::Forbidden(
            "Not allowed to access this task".to_string(),
        ));
    }

    Ok(task)
}
