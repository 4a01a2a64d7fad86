/// Task statuses: the ordered Kanban columns of a project
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_statuses (
///     id BIGSERIAL PRIMARY KEY,
///     project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     name VARCHAR(100) NOT NULL,
///     color VARCHAR(32),
///     position INTEGER NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Neither name nor position is unique. Ordering is by position, then id,
/// so duplicate positions still list deterministically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

/// A column seeded into every new project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultStatus {
    pub name: &'static str,
    pub color: &'static str,
    pub position: i32,
}

/// Columns every project starts with, in insertion order
pub const DEFAULT_STATUSES: [DefaultStatus; 3] = [
    DefaultStatus {
        name: "To Do",
        color: "#FF0000",
        position: 1,
    },
    DefaultStatus {
        name: "In Progress",
        color: "#00FF00",
        position: 2,
    },
    DefaultStatus {
        name: "Done",
        color: "#0000FF",
        position: 3,
    },
];

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskStatus {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub color: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskStatus {
    pub project_id: i64,
    pub name: String,

    /// Stored as NULL when absent
    pub color: Option<String>,

    /// Defaults to 0 when absent
    pub position: Option<i32>,
}

impl TaskStatus {
    /// Inserts a status with any executor, so project creation can seed
    /// columns inside its own transaction
    pub async fn insert<'e, E>(executor: E, data: CreateTaskStatus) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, TaskStatus>(
            r#"
            INSERT INTO task_statuses (project_id, name, color, position)
            VALUES ($1, $2, $3, $4)
            RETURNING id, project_id, name, color, position, created_at, updated_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.name.trim().to_string())
        .bind(data.color)
        .bind(data.position.unwrap_or(0))
        .fetch_one(executor)
        .await
    }

    pub async fn create(pool: &PgPool, data: CreateTaskStatus) -> Result<Self, sqlx::Error> {
        Self::insert(pool, data).await
    }

    /// Statuses of a project, lowest position first
    pub async fn list_by_project(pool: &PgPool, project_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskStatus>(
            r#"
            SELECT id, project_id, name, color, position, created_at, updated_at
            FROM task_statuses
            WHERE project_id = $1
            ORDER BY position ASC, id ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// The status, only if it belongs to `project_id`
    pub async fn find_in_project(
        pool: &PgPool,
        project_id: i64,
        status_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskStatus>(
            r#"
            SELECT id, project_id, name, color, position, created_at, updated_at
            FROM task_statuses
            WHERE id = $1 AND project_id = $2
            "#,
        )
        .bind(status_id)
        .bind(project_id)
        .fetch_optional(pool)
        .await
    }

    /// Lowest-position status: where new tasks land by default
    pub async fn first_for_project(
        pool: &PgPool,
        project_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskStatus>(
            r#"
            SELECT id, project_id, name, color, position, created_at, updated_at
            FROM task_statuses
            WHERE project_id = $1
            ORDER BY position ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(project_id)
        .fetch_optional(pool)
        .await
    }
}
