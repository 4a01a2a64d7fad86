/// Tenant roles
///
/// Roles are rows in the `roles` table, seeded by the first migration. Code
/// never compares raw role ids: it works with the [`Role`] enumeration and
/// resolves the row id by title when it needs to write a membership.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE roles (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(50) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::{fmt, str::FromStr};

/// Role a user holds inside a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages memberships; created tenants start with their creator as admin
    Admin,

    /// Works with projects, statuses and tasks
    Member,
}

impl Role {
    /// Title as stored in `roles.title`
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }

    pub fn can_manage_members(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Resolves the `roles.id` for this role
    ///
    /// Returns `None` when the seed row is missing, which callers treat as
    /// an integrity failure rather than a user error.
    pub async fn lookup_id(&self, pool: &PgPool) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM roles WHERE title = $1")
            .bind(self.as_str())
            .fetch_optional(pool)
            .await
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// A row of the `roles` table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RoleRecord {
    pub id: i64,
    pub title: String,
}

impl RoleRecord {
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, RoleRecord>("SELECT id, title FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Parsed role, if the title is one this build knows about
    pub fn role(&self) -> Option<Role> {
        self.title.parse().ok()
    }
}
