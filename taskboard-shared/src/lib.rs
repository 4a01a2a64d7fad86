//! # Taskboard Shared Library
//!
//! Types, persistence and auth primitives shared by the Taskboard API
//! server and its tests.
//!
//! ## Module Organization
//!
//! - `db`: connection pool and migrations
//! - `models`: one module per table, queries as associated functions
//! - `auth`: passwords, tokens, request identity and tenant access checks
//! - `realtime`: per-project event fan-out

pub mod auth;
pub mod db;
pub mod models;
pub mod realtime;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
