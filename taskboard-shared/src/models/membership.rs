/// Membership model: the (user, tenant, role) relation
///
/// # Schema
///
/// ```sql
/// CREATE TABLE user_tenants (
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     tenant_id BIGINT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
///     role_id BIGINT NOT NULL REFERENCES roles(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT user_tenants_pkey PRIMARY KEY (user_id, tenant_id)
/// );
/// ```
///
/// The primary key enforces at most one membership per (user, tenant).
/// Every read joins `roles` so callers get the role title alongside its id.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::membership::{CreateMembership, Membership};
/// use taskboard_shared::models::role::Role;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, tenant_id: i64, user_id: i64) -> Result<(), sqlx::Error> {
/// let role_id = Role::Member.lookup_id(&pool).await?.expect("roles are seeded");
/// let membership = Membership::create(&pool, CreateMembership { tenant_id, user_id, role_id }).await?;
/// assert_eq!(membership.role_name, "member");
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::role::Role;

/// Name of the primary key backing the one-membership-per-pair rule
pub const MEMBERSHIP_KEY_CONSTRAINT: &str = "user_tenants_pkey";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    pub user_id: i64,
    pub tenant_id: i64,
    pub role_id: i64,

    /// `roles.title` for `role_id`
    pub role_name: String,

    pub created_at: DateTime<Utc>,
}

impl Membership {
    /// Parsed role; `None` only if the roles table holds a title this
    /// build does not know
    pub fn role(&self) -> Option<Role> {
        self.role_name.parse().ok()
    }
}

/// Input for adding a user to a tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    pub tenant_id: i64,
    pub user_id: i64,
    pub role_id: i64,
}

impl Membership {
    /// Adds a user to a tenant
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on [`MEMBERSHIP_KEY_CONSTRAINT`] if the
    /// user is already a member, or a foreign key violation if any
    /// referenced row is missing.
    pub async fn create(pool: &PgPool, data: CreateMembership) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Membership>(
            r#"
            WITH inserted AS (
                INSERT INTO user_tenants (user_id, tenant_id, role_id)
                VALUES ($1, $2, $3)
                RETURNING user_id, tenant_id, role_id, created_at
            )
            SELECT i.user_id, i.tenant_id, i.role_id, r.title AS role_name, i.created_at
            FROM inserted i
            JOIN roles r ON r.id = i.role_id
            "#,
        )
        .bind(data.user_id)
        .bind(data.tenant_id)
        .bind(data.role_id)
        .fetch_one(pool)
        .await
    }

    /// The user's membership in a tenant, if any
    pub async fn find(
        pool: &PgPool,
        tenant_id: i64,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT ut.user_id, ut.tenant_id, ut.role_id, r.title AS role_name, ut.created_at
            FROM user_tenants ut
            JOIN roles r ON r.id = ut.role_id
            WHERE ut.tenant_id = $1 AND ut.user_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_by_tenant(pool: &PgPool, tenant_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT ut.user_id, ut.tenant_id, ut.role_id, r.title AS role_name, ut.created_at
            FROM user_tenants ut
            JOIN roles r ON r.id = ut.role_id
            WHERE ut.tenant_id = $1
            ORDER BY ut.created_at ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await
    }
}
