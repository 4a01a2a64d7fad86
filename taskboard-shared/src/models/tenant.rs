/// Tenant model and database operations
///
/// A tenant is the organization boundary: it owns projects and is reached
/// by users through memberships (`user_tenants`).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tenants (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::{role::Role, tenant::{CreateTenant, Tenant}};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, owner_id: i64) -> Result<(), sqlx::Error> {
/// let admin_role_id = Role::Admin.lookup_id(&pool).await?.expect("roles are seeded");
///
/// let tenant = Tenant::create_with_owner(
///     &pool,
///     CreateTenant { name: "Acme Corp".to_string() },
///     owner_id,
///     admin_role_id,
/// ).await?;
///
/// let mine = Tenant::list_for_user(&pool, owner_id).await?;
/// assert!(mine.iter().any(|t| t.id == tenant.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tenant {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub name: String,
}

impl Tenant {
    /// Creates a tenant and makes `owner_id` its first member
    ///
    /// Both rows are written in one transaction: either the tenant exists
    /// together with the owner's membership, or neither does.
    ///
    /// # Arguments
    ///
    /// * `owner_role_id` - `roles.id` of the role the owner receives
    ///   (resolved by the caller from [`Role::Admin`](super::role::Role))
    pub async fn create_with_owner(
        pool: &PgPool,
        data: CreateTenant,
        owner_id: i64,
        owner_role_id: i64,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name)
            VALUES ($1)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(data.name.trim())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO user_tenants (user_id, tenant_id, role_id) VALUES ($1, $2, $3)")
            .bind(owner_id)
            .bind(tenant.id)
            .bind(owner_role_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(tenant_id = tenant.id, owner_id, "Tenant created");
        Ok(tenant)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(
            "SELECT id, name, created_at, updated_at FROM tenants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn exists(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tenants WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Tenants the user belongs to, oldest first
    ///
    /// An empty vector is a normal answer for a user with no memberships.
    pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(
            r#"
            SELECT t.id, t.name, t.created_at, t.updated_at
            FROM tenants t
            JOIN user_tenants ut ON ut.tenant_id = t.id
            WHERE ut.user_id = $1
            ORDER BY t.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
