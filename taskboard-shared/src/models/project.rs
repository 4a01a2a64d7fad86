/// Project model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id BIGSERIAL PRIMARY KEY,
///     tenant_id BIGINT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Projects are always addressed together with their tenant; a project id
/// from another tenant behaves exactly like a missing one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::task_status::{CreateTaskStatus, TaskStatus, DEFAULT_STATUSES};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub tenant_id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl Project {
    /// Creates a project and seeds its default columns
    ///
    /// The project row and the three [`DEFAULT_STATUSES`] are written in a
    /// single transaction, in the order listed there.
    pub async fn create_with_default_statuses(
        pool: &PgPool,
        data: CreateProject,
    ) -> Result<(Self, Vec<TaskStatus>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (tenant_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, tenant_id, name, description, created_at, updated_at
            "#,
        )
        .bind(data.tenant_id)
        .bind(data.name.trim())
        .bind(data.description)
        .fetch_one(&mut *tx)
        .await?;

        let mut statuses = Vec::with_capacity(DEFAULT_STATUSES.len());
        for status in DEFAULT_STATUSES {
            let seeded = TaskStatus::insert(
                &mut *tx,
                CreateTaskStatus {
                    project_id: project.id,
                    name: status.name.to_string(),
                    color: Some(status.color.to_string()),
                    position: Some(status.position),
                },
            )
            .await?;
            statuses.push(seeded);
        }

        tx.commit().await?;

        tracing::info!(
            tenant_id = project.tenant_id,
            project_id = project.id,
            "Project created with default statuses"
        );
        Ok((project, statuses))
    }

    /// The project, only if it belongs to `tenant_id`
    pub async fn find_in_tenant(
        pool: &PgPool,
        tenant_id: i64,
        project_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, tenant_id, name, description, created_at, updated_at
            FROM projects
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(project_id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
    }

    /// Unscoped lookup, used when only the project id is known (realtime joins)
    pub async fn find_by_id(pool: &PgPool, project_id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, tenant_id, name, description, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(project_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_by_tenant(pool: &PgPool, tenant_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, tenant_id, name, description, created_at, updated_at
            FROM projects
            WHERE tenant_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await
    }
}
