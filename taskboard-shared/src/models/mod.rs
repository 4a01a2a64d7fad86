/// Database models for Taskboard
///
/// One module per table. Each model is a `sqlx::FromRow` struct with its
/// queries as associated functions taking the pool explicitly.
///
/// # Models
///
/// - `user`: accounts and credentials
/// - `role`: the `Role` enumeration and its `roles` rows
/// - `tenant`: organizations
/// - `membership`: (user, tenant, role) rows in `user_tenants`
/// - `project`: projects inside a tenant
/// - `task_status`: ordered Kanban columns of a project
/// - `task`: cards on the board

pub mod membership;
pub mod project;
pub mod role;
pub mod task;
pub mod task_status;
pub mod tenant;
pub mod user;
