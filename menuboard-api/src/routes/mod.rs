/// API route handlers
///
/// - `health`: Health check
/// - `auth`: Registration, login, token refresh
/// - `public`: Customer-facing menu, ordering and waiter calls
/// - `admin`: Restaurant back office
/// - `billing`: Payment provider webhook
/// - `super_admin`: Platform administration
/// - `feed`: Polling envelope shared by the admin feeds

pub mod admin;
pub mod auth;
pub mod billing;
pub mod feed;
pub mod health;
pub mod public;
pub mod super_admin;
