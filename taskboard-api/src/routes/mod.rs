/// API route handlers, by resource
///
/// - `health`: liveness and database probe
/// - `auth`: register, login, profile
/// - `tenants`: tenants and memberships
/// - `projects`, `statuses`, `tasks`: the project board
/// - `realtime`: WebSocket subscriptions to task events

pub mod auth;
pub mod health;
pub mod projects;
pub mod realtime;
pub mod statuses;
pub mod tasks;
pub mod tenants;
