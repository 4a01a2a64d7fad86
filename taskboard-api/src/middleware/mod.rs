/// Middleware modules for the API server
///
/// - `security`: response security headers
/// - `access`: tenant membership and project scope checks

pub mod access;
pub mod security;
