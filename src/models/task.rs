// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! To-do task model. Plain CRUD, no cross-collection side effects.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskPriority {
    Pending,
    Urgent,
    Scheduled,
}

/// Stored task record in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Document ID (UUID v4)
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Due date (RFC3339)
    pub due_date: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Owning user (auth provider local ID)
    pub owner_id: String,
    pub created_at: String,
    pub updated_at: String,
}
