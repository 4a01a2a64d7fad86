/// Tenant access and project scope layers
///
/// Both run as `route_layer`s, after routing, so path parameters are
/// available. They expect the JWT layer to have attached an
/// [`AuthContext`] and attach their own result for handlers:
///
/// - [`authorize_tenant_access`] inserts a [`TenantAccess`] (400/404/403)
/// - [`authorize_project_access`] inserts a [`ProjectScope`] (400/404)

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use taskboard_shared::auth::{
    authorization::{resolve_project_scope, resolve_tenant_access, TenantAccess},
    middleware::AuthContext,
};

#[cfg(doc)]
use taskboard_shared::auth::authorization::ProjectScope;

fn path_param<'a>(params: &'a HashMap<String, String>, name: &str) -> &'a str {
    params.get(name).map(String::as_str).unwrap_or_default()
}

pub async fn authorize_tenant_access(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("Missing credentials".to_string()))?;

    let access =
        resolve_tenant_access(&state.db, auth.user_id, path_param(&params, "tenant_id")).await?;

    tracing::debug!(
        user_id = auth.user_id,
        tenant_id = access.tenant_id,
        role = %access.role_name,
        "Tenant access granted"
    );

    req.extensions_mut().insert(access);
    Ok(next.run(req).await)
}

pub async fn authorize_project_access(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let access = req
        .extensions()
        .get::<TenantAccess>()
        .cloned()
        .ok_or_else(|| ApiError::InternalError("Tenant access not resolved".to_string()))?;

    let scope =
        resolve_project_scope(&state.db, &access, path_param(&params, "project_id")).await?;

    req.extensions_mut().insert(scope);
    Ok(next.run(req).await)
}
