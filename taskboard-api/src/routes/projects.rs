/// Project endpoints, all under `/api/tenants/:tenant_id`
///
/// - `GET /projects` - Projects of the tenant, by id (`[]` when none)
/// - `POST /projects` - Create a project with its default statuses
/// - `GET /projects/:project_id` - Project detail

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
    auth::authorization::{ProjectScope, TenantAccess},
    models::project::{CreateProject, Project},
};

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(access): Extension<TenantAccess>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = Project::list_by_tenant(&state.db, access.tenant_id).await?;
    Ok(Json(projects))
}

/// Creates the project and seeds "To Do", "In Progress" and "Done"
pub async fn create_project(
    State(state): State<AppState>,
    Extension(access): Extension<TenantAccess>,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let Json(req) = payload?;

    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Project name is required".to_string()));
    }

    let (project, _statuses) = Project::create_with_default_statuses(
        &state.db,
        CreateProject {
            tenant_id: access.tenant_id,
            name: req.name,
            description: req.description,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(Extension(scope): Extension<ProjectScope>) -> Json<Project> {
    Json(scope.project)
}
