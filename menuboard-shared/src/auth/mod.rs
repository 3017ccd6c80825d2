/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and policy
/// - [`jwt`]: Access/refresh token generation and validation
/// - [`middleware`]: Bearer-token extraction for Axum
/// - [`authorization`]: Role and tenant checks
/// - [`signature`]: HMAC-SHA256 webhook signatures
///
/// # Example
///
/// ```no_run
/// use menuboard_shared::auth::password::{hash_password, verify_password};
/// use menuboard_shared::auth::jwt::issue_token_pair;
/// use menuboard_shared::models::admin_user::AdminRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Kitchen2024")?;
/// assert!(verify_password("Kitchen2024", &hash)?);
///
/// let tokens = issue_token_pair(Uuid::new_v4(), Some(Uuid::new_v4()), AdminRole::Owner, "secret-key-at-least-32-bytes-long")?;
/// println!("{}", tokens.access_token);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod signature;
