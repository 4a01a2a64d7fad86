/// Task endpoints, under `/api/tenants/:tenant_id/projects/:project_id`
///
/// - `GET /tasks` - Tasks with their status, board order
/// - `POST /tasks` - Create a task
/// - `GET /tasks/:task_id` - Task detail with its status
/// - `PUT /tasks/:task_id` - Partial update
/// - `DELETE /tasks/:task_id` - Delete
///
/// Every successful write is published to the project's realtime channel
/// after the database change.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use taskboard_shared::{
    auth::authorization::{parse_id, ProjectScope},
    models::{
        task::{CreateTask, Task, TaskWithStatus, UpdateTask},
        task_status::TaskStatus,
    },
    realtime::TaskEvent,
};

const INVALID_STATUS: &str = "Invalid status_id for this project";

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,

    /// Lowest-position status when absent
    pub status_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,

    /// `None` when absent, `Some(None)` for an explicit `null`
    #[serde(default, deserialize_with = "present")]
    pub status_id: Option<Option<i64>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

fn task_id(params: &HashMap<String, String>) -> ApiResult<i64> {
    let raw = params.get("task_id").map(String::as_str).unwrap_or_default();
    Ok(parse_id(raw, "task")?)
}

fn require_title(title: &str) -> ApiResult<()> {
    if title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }
    Ok(())
}

/// The status id, if it names a status of this project
async fn status_in_project(state: &AppState, project_id: i64, status_id: i64) -> ApiResult<i64> {
    TaskStatus::find_in_project(&state.db, project_id, status_id)
        .await?
        .map(|status| status.id)
        .ok_or_else(|| ApiError::BadRequest(INVALID_STATUS.to_string()))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(scope): Extension<ProjectScope>,
) -> ApiResult<Json<Vec<TaskWithStatus>>> {
    let tasks = Task::list_with_status(&state.db, scope.project_id).await?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(scope): Extension<ProjectScope>,
    Path(params): Path<HashMap<String, String>>,
) -> ApiResult<Json<TaskWithStatus>> {
    let task_id = task_id(&params)?;

    let task = Task::find_with_status(&state.db, scope.project_id, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Creates a task and publishes `taskCreated`
///
/// # Errors
///
/// - `400 Bad Request`: empty title, a `status_id` from another project,
///   or no status to default to
pub async fn create_task(
    State(state): State<AppState>,
    Extension(scope): Extension<ProjectScope>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let Json(req) = payload?;
    require_title(&req.title)?;

    let status_id = match req.status_id {
        Some(status_id) => status_in_project(&state, scope.project_id, status_id).await?,
        None => {
            TaskStatus::first_for_project(&state.db, scope.project_id)
                .await?
                .ok_or_else(|| {
                    ApiError::BadRequest("No statuses defined for this project".to_string())
                })?
                .id
        }
    };

    let task = Task::create(
        &state.db,
        CreateTask {
            project_id: scope.project_id,
            status_id,
            title: req.title,
            description: req.description,
        },
    )
    .await?;

    tracing::info!(project_id = scope.project_id, task_id = task.id, "Task created");

    state
        .realtime
        .publish(scope.project_id, TaskEvent::TaskCreated(task.clone()))
        .await;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Applies a partial update and publishes `taskUpdated`
///
/// Absent fields are left unchanged. A rejected `status_id`, including an
/// explicit `null`, leaves the task untouched.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(scope): Extension<ProjectScope>,
    Path(params): Path<HashMap<String, String>>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let task_id = task_id(&params)?;
    let Json(req) = payload?;

    if let Some(title) = &req.title {
        require_title(title)?;
    }

    if Task::find_with_status(&state.db, scope.project_id, task_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    match req.status_id {
        Some(Some(status_id)) => {
            status_in_project(&state, scope.project_id, status_id).await?;
        }
        Some(None) => return Err(ApiError::BadRequest(INVALID_STATUS.to_string())),
        None => {}
    }

    let task = Task::update(
        &state.db,
        scope.project_id,
        task_id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status_id: req.status_id.flatten(),
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::info!(
        project_id = scope.project_id,
        task_id,
        status_id = task.status_id,
        "Task updated"
    );

    state
        .realtime
        .publish(scope.project_id, TaskEvent::TaskUpdated(task.clone()))
        .await;

    Ok(Json(task))
}

/// Deletes a task and publishes `taskDeleted`; nothing is published on 404
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(scope): Extension<ProjectScope>,
    Path(params): Path<HashMap<String, String>>,
) -> ApiResult<StatusCode> {
    let task_id = task_id(&params)?;

    if !Task::delete(&state.db, scope.project_id, task_id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    tracing::info!(project_id = scope.project_id, task_id, "Task deleted");

    state
        .realtime
        .publish(scope.project_id, TaskEvent::TaskDeleted { id: task_id })
        .await;

    Ok(StatusCode::NO_CONTENT)
}
