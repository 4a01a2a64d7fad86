/// Tenant and project access checks
///
/// Every tenant-scoped request goes through the same policy:
///
/// 1. The tenant id must be a well-formed integer (else [`AuthzError::InvalidId`])
/// 2. The tenant must exist (else [`AuthzError::TenantNotFound`])
/// 3. The caller must hold a membership in it (else [`AuthzError::NotMember`])
///
/// Project-scoped requests additionally require the project to belong to
/// that tenant. A project in another tenant is reported as not found, so
/// ids cannot be probed across tenants.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::authorization::{require_admin, resolve_tenant_access};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, user_id: i64) -> Result<(), Box<dyn std::error::Error>> {
/// let access = resolve_tenant_access(&pool, user_id, "42").await?;
/// require_admin(&access)?;
/// # Ok(())
/// # }
/// ```

use serde::Serialize;
use sqlx::PgPool;

use crate::models::{membership::Membership, project::Project, role::Role, tenant::Tenant};

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Path segment is not an integer id
    #[error("Invalid {0} id")]
    InvalidId(&'static str),

    #[error("Tenant not found")]
    TenantNotFound,

    #[error("Access denied to this tenant")]
    NotMember,

    #[error("Project not found")]
    ProjectNotFound,

    #[error("Insufficient permissions: requires {required}")]
    InsufficientRole { required: Role },

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Caller's membership in the tenant named by the request
#[derive(Debug, Clone, Serialize)]
pub struct TenantAccess {
    pub tenant_id: i64,
    pub role_id: i64,

    /// `None` if `roles.title` is not a role this build knows
    pub role: Option<Role>,

    pub role_name: String,
}

impl TenantAccess {
    pub fn is_admin(&self) -> bool {
        self.role.is_some_and(|role| role.can_manage_members())
    }
}

/// A project verified to belong to the caller's tenant
#[derive(Debug, Clone, Serialize)]
pub struct ProjectScope {
    pub tenant_id: i64,
    pub project_id: i64,
    pub project: Project,
}

/// Parses a path id; `label` names it in the error ("tenant", "project", ...)
pub fn parse_id(raw: &str, label: &'static str) -> Result<i64, AuthzError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AuthzError::InvalidId(label))
}

/// Resolves the caller's access to a tenant: 400, then 404, then 403
pub async fn resolve_tenant_access(
    pool: &PgPool,
    user_id: i64,
    raw_tenant_id: &str,
) -> Result<TenantAccess, AuthzError> {
    let tenant_id = parse_id(raw_tenant_id, "tenant")?;

    if !Tenant::exists(pool, tenant_id).await? {
        return Err(AuthzError::TenantNotFound);
    }

    let membership = Membership::find(pool, tenant_id, user_id)
        .await?
        .ok_or(AuthzError::NotMember)?;

    Ok(TenantAccess {
        tenant_id,
        role_id: membership.role_id,
        role: membership.role(),
        role_name: membership.role_name,
    })
}

/// Resolves a project inside an already-authorized tenant
pub async fn resolve_project_scope(
    pool: &PgPool,
    access: &TenantAccess,
    raw_project_id: &str,
) -> Result<ProjectScope, AuthzError> {
    let project_id = parse_id(raw_project_id, "project")?;

    let project = Project::find_in_tenant(pool, access.tenant_id, project_id)
        .await?
        .ok_or(AuthzError::ProjectNotFound)?;

    Ok(ProjectScope {
        tenant_id: access.tenant_id,
        project_id,
        project,
    })
}

pub fn require_admin(access: &TenantAccess) -> Result<(), AuthzError> {
    if !access.is_admin() {
        return Err(AuthzError::InsufficientRole {
            required: Role::Admin,
        });
    }

    Ok(())
}

/// Checks that a realtime subscriber may follow a project
///
/// The project must exist and the user must be a member of its tenant.
/// Both failures are reported as [`AuthzError::ProjectNotFound`] and
/// [`AuthzError::NotMember`] respectively.
pub async fn authorize_project_join(
    pool: &PgPool,
    user_id: i64,
    project_id: i64,
) -> Result<Project, AuthzError> {
    let project = Project::find_by_id(pool, project_id)
        .await?
        .ok_or(AuthzError::ProjectNotFound)?;

    if Membership::find(pool, project.tenant_id, user_id)
        .await?
        .is_none()
    {
        return Err(AuthzError::NotMember);
    }

    Ok(project)
}
