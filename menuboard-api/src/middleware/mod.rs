/// Middleware for the API server
///
/// - `security`: Hardening response headers
/// - `auth`: Bearer-token authentication layers for admin and super-admin routes

pub mod auth;
pub mod security;
