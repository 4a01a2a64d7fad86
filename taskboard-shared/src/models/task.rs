/// Task model and database operations
///
/// Tasks are the cards on a project's board. Each task sits in exactly one
/// status of its own project; moving a task means changing `status_id`, and
/// any status may follow any other.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     status_id BIGINT NOT NULL REFERENCES task_statuses(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// The schema cannot express "status belongs to the same project"; callers
/// check it with [`TaskStatus::find_in_project`](super::task_status::TaskStatus::find_in_project)
/// before writing.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::task::{CreateTask, Task, UpdateTask};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, project_id: i64, todo: i64, done: i64) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     project_id,
///     status_id: todo,
///     title: "Write release notes".to_string(),
///     description: None,
/// }).await?;
///
/// Task::update(&pool, project_id, task.id, UpdateTask {
///     status_id: Some(done),
///     ..Default::default()
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// A task row, as returned by writes and carried by realtime events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status_id: i64,
    pub project_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task joined with its status, as returned by reads
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskWithStatus {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status_id: i64,
    pub status_name: String,
    pub status_color: Option<String>,
    pub status_position: i32,
    pub project_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task; `status_id` is already validated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub project_id: i64,
    pub status_id: i64,
    pub title: String,
    pub description: Option<String>,
}

/// Partial update: `None` leaves the column unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status_id: Option<i64>,
}

impl UpdateTask {
    /// SQL for this update; `$1` is the task id, `$2` the project id, and
    /// present fields follow in declaration order
    fn to_sql(&self) -> String {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if self.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if self.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if self.status_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status_id = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 AND project_id = $2 \
             RETURNING id, title, description, status_id, project_id, created_at, updated_at",
        );
        query
    }
}

const TASK_WITH_STATUS_SELECT: &str = r#"
    SELECT
        t.id,
        t.title,
        t.description,
        t.status_id,
        ts.name AS status_name,
        ts.color AS status_color,
        ts.position AS status_position,
        t.project_id,
        t.created_at,
        t.updated_at
    FROM tasks t
    JOIN task_statuses ts ON ts.id = t.status_id
"#;

impl Task {
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (project_id, status_id, title, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, status_id, project_id, created_at, updated_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.status_id)
        .bind(data.title.trim())
        .bind(data.description)
        .fetch_one(pool)
        .await
    }

    /// Board listing: by column position, newest first within a column
    pub async fn list_with_status(
        pool: &PgPool,
        project_id: i64,
    ) -> Result<Vec<TaskWithStatus>, sqlx::Error> {
        let query = format!(
            "{} WHERE t.project_id = $1 ORDER BY ts.position ASC, t.created_at DESC, t.id DESC",
            TASK_WITH_STATUS_SELECT
        );

        sqlx::query_as::<_, TaskWithStatus>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_with_status(
        pool: &PgPool,
        project_id: i64,
        task_id: i64,
    ) -> Result<Option<TaskWithStatus>, sqlx::Error> {
        let query = format!(
            "{} WHERE t.id = $1 AND t.project_id = $2",
            TASK_WITH_STATUS_SELECT
        );

        sqlx::query_as::<_, TaskWithStatus>(&query)
            .bind(task_id)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// Applies a partial update
    ///
    /// Returns `None` if no task with this id exists in the project.
    pub async fn update(
        pool: &PgPool,
        project_id: i64,
        task_id: i64,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = data.to_sql();
        let mut q = sqlx::query_as::<_, Task>(&query)
            .bind(task_id)
            .bind(project_id);

        if let Some(title) = data.title {
            q = q.bind(title.trim().to_string());
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status_id) = data.status_id {
            q = q.bind(status_id);
        }

        q.fetch_optional(pool).await
    }

    /// Hard delete; returns whether a row was removed
    pub async fn delete(pool: &PgPool, project_id: i64, task_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND project_id = $2")
            .bind(task_id)
            .bind(project_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
