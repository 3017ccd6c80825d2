//! # Menuboard Shared Library
//!
//! This crate contains shared types, utilities, and business logic used across
//! the Menuboard API server and maintenance worker.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their tenant-scoped queries
//! - `auth`: Authentication, authorization and webhook signatures
//! - `access`: Trial / subscription gating
//! - `cart`: Cart aggregation and catalog pricing
//! - `slug`: Tenant slug validation and generation
//! - `db`: Connection pool and migrations

pub mod access;
pub mod auth;
pub mod cart;
pub mod db;
pub mod models;
pub mod slug;

/// Current version of the Menuboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
