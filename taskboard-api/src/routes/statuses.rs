/// Status endpoints, under `/api/tenants/:tenant_id/projects/:project_id`
///
/// - `GET /statuses` - Columns by position
/// - `POST /statuses` - Add a column

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskboard_shared::{
    auth::authorization::ProjectScope,
    models::task_status::{CreateTaskStatus, TaskStatus},
};

#[derive(Debug, Deserialize)]
pub struct CreateStatusRequest {
    #[serde(default)]
    pub name: String,
    pub color: Option<String>,
    pub position: Option<i32>,
}

pub async fn list_statuses(
    State(state): State<AppState>,
    Extension(scope): Extension<ProjectScope>,
) -> ApiResult<Json<Vec<TaskStatus>>> {
    let statuses = TaskStatus::list_by_project(&state.db, scope.project_id).await?;
    Ok(Json(statuses))
}

/// Position defaults to 0 and color to null
pub async fn create_status(
    State(state): State<AppState>,
    Extension(scope): Extension<ProjectScope>,
    payload: Result<Json<CreateStatusRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TaskStatus>)> {
    let Json(req) = payload?;

    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Status name is required".to_string()));
    }

    let status = TaskStatus::create(
        &state.db,
        CreateTaskStatus {
            project_id: scope.project_id,
            name: req.name,
            color: req.color,
            position: req.position,
        },
    )
    .await?;

    tracing::info!(
        project_id = scope.project_id,
        status_id = status.id,
        position = status.position,
        "Status created"
    );

    Ok((StatusCode::CREATED, Json(status)))
}
