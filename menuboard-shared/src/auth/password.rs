/// Admin password hashing and policy
///
/// Passwords are hashed with Argon2id (64 MB memory, 3 iterations, 4 lanes)
/// and a random salt. Parameters are embedded in the PHC string, so stored
/// hashes keep verifying if the parameters change later.
///
/// # Example
///
/// ```
/// use menuboard_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Kitchen2024")?;
/// assert!(verify_password("Kitchen2024", &hash)?);
/// assert!(!verify_password("kitchen2024", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Minimum password length in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length in bytes (bounds hashing cost)
pub const MAX_PASSWORD_BYTES: usize = 128;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),

    #[error("{0}")]
    TooWeak(&'static str),
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password into a PHC string (`$argon2id$v=19$m=65536,t=3,p=4$...`)
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored hash
///
/// Returns `Ok(false)` for a wrong password. A stored hash that isn't a
/// complete Argon2 PHC string (algorithm, salt and hash output) is an error,
/// never a mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    argon2::Algorithm::new(parsed.algorithm.as_str())
        .map_err(|e| PasswordError::InvalidHash(format!("Unsupported algorithm: {}", e)))?;

    if parsed.salt.is_none() || parsed.hash.is_none() {
        return Err(PasswordError::InvalidHash(
            "Missing salt or hash output".to_string(),
        ));
    }

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Checks the back-office password policy
///
/// At least 8 characters with at least one letter and one digit, and no more
/// than 128 bytes.
pub fn validate_password_strength(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooWeak(
            "Password must be at least 8 characters long",
        ));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(PasswordError::TooWeak(
            "Password must be at most 128 bytes long",
        ));
    }

    if !password.chars().any(char::is_alphabetic) {
        return Err(PasswordError::TooWeak(
            "Password must contain at least one letter",
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordError::TooWeak(
            "Password must contain at least one digit",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_format() {
        let hash = hash_password("Kitchen2024").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_hash_password_salts_differ() {
        let a = hash_password("same_password1").unwrap();
        let b = hash_password("same_password1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("Sup3r-secret").unwrap();

        assert!(verify_password("Sup3r-secret", &hash).unwrap());
        assert!(!verify_password("sup3r-secret", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("password", "invalid_hash").is_err());
        assert!(verify_password("password", "$argon2id$invalid").is_err());
    }

    #[test]
    fn test_verify_password_incomplete_hash() {
        let hash = hash_password("Kitchen2024").unwrap();

        // Drop the hash output, keep params and salt
        let truncated = &hash[..hash.rfind('$').unwrap()];
        assert!(matches!(
            verify_password("Kitchen2024", truncated),
            Err(PasswordError::InvalidHash(_))
        ));

        let foreign = hash.replacen("$argon2id$", "$scrypt$", 1);
        assert!(matches!(
            verify_password("Kitchen2024", &foreign),
            Err(PasswordError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("pizza2024").is_ok());
        assert!(validate_password_strength("Çorba-1-sıcak").is_ok());

        for weak in ["abc123", "onlyletters", "1234567890"] {
            assert!(
                matches!(validate_password_strength(weak), Err(PasswordError::TooWeak(_))),
                "'{}' should be rejected",
                weak
            );
        }

        let long = format!("a1{}", "x".repeat(MAX_PASSWORD_BYTES));
        assert!(validate_password_strength(&long).is_err());
    }
}
