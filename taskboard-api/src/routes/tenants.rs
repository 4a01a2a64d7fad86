/// Tenant endpoints
///
/// # Endpoints
///
/// - `GET /api/tenants` - Tenants the caller belongs to
/// - `POST /api/tenants` - Create a tenant; the caller becomes its admin
/// - `GET /api/tenants/:tenant_id` - Tenant detail with the caller's role
/// - `GET /api/tenants/:tenant_id/users` - Memberships of the tenant
/// - `POST /api/tenants/:tenant_id/users` - Add a member (admins only)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{
        authorization::{require_admin, TenantAccess},
        middleware::AuthContext,
    },
    models::{
        membership::{CreateMembership, Membership},
        role::{Role, RoleRecord},
        tenant::{CreateTenant, Tenant},
        user::User,
    },
};

#[derive(Debug, Deserialize)]
pub struct CreateTenantRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddUserRequest {
    #[serde(default)]
    pub email: String,

    /// `roles.id`; defaults to the member role
    pub role_id: Option<i64>,
}

/// Tenant as seen by one of its members
#[derive(Debug, Serialize, Deserialize)]
pub struct TenantDetail {
    #[serde(flatten)]
    pub tenant: Tenant,
    pub role: String,
}

pub async fn list_tenants(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Tenant>>> {
    let tenants = Tenant::list_for_user(&state.db, auth.user_id).await?;
    Ok(Json(tenants))
}

/// Creates a tenant and the creator's admin membership in one transaction
pub async fn create_tenant(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<CreateTenantRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Tenant>)> {
    let Json(req) = payload?;

    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Tenant name is required".to_string()));
    }

    let admin_role_id = Role::Admin
        .lookup_id(&state.db)
        .await?
        .ok_or_else(|| ApiError::InternalError("Role 'admin' is not seeded".to_string()))?;

    let tenant = Tenant::create_with_owner(
        &state.db,
        CreateTenant {
            name: name.to_string(),
        },
        auth.user_id,
        admin_role_id,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(tenant)))
}

pub async fn get_tenant(
    State(state): State<AppState>,
    Extension(access): Extension<TenantAccess>,
) -> ApiResult<Json<TenantDetail>> {
    let tenant = Tenant::find_by_id(&state.db, access.tenant_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tenant not found".to_string()))?;

    Ok(Json(TenantDetail {
        tenant,
        role: access.role_name,
    }))
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(access): Extension<TenantAccess>,
) -> ApiResult<Json<Vec<Membership>>> {
    let members = Membership::list_by_tenant(&state.db, access.tenant_id).await?;
    Ok(Json(members))
}

/// Adds an existing user to the tenant
///
/// # Errors
///
/// - `403 Forbidden`: caller is not an admin of the tenant
/// - `404 Not Found`: no user with that email
/// - `400 Bad Request`: missing email or unknown `role_id`
/// - `409 Conflict`: user is already a member
pub async fn add_user_to_tenant(
    State(state): State<AppState>,
    Extension(access): Extension<TenantAccess>,
    payload: Result<Json<AddUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Membership>)> {
    require_admin(&access)?;

    let Json(req) = payload?;
    if req.email.trim().is_empty() {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    }

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let role_id = match req.role_id {
        Some(role_id) => {
            RoleRecord::find_by_id(&state.db, role_id)
                .await?
                .ok_or_else(|| ApiError::BadRequest("Invalid role_id".to_string()))?
                .id
        }
        None => Role::Member
            .lookup_id(&state.db)
            .await?
            .ok_or_else(|| ApiError::InternalError("Role 'member' is not seeded".to_string()))?,
    };

    if Membership::find(&state.db, access.tenant_id, user.id)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "User is already a member of this tenant".to_string(),
        ));
    }

    // A concurrent insert trips the primary key and is mapped to the same 409
    let membership = Membership::create(
        &state.db,
        CreateMembership {
            tenant_id: access.tenant_id,
            user_id: user.id,
            role_id,
        },
    )
    .await?;

    tracing::info!(
        tenant_id = access.tenant_id,
        user_id = user.id,
        role = %membership.role_name,
        "User added to tenant"
    );

    Ok((StatusCode::CREATED, Json(membership)))
}
