//! Password hashing for local staff credentials.
//!
//! Digests are argon2id in PHC string format, so the salt and cost parameters travel with
//! the digest and can be tightened later without rehashing everything at once.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use password_hash::SaltString;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PasswordHashError {
    #[error("Could not generate a random salt: {0}")]
    Salt(String),
    #[error("Could not hash the password: {0}")]
    Hash(String),
}

/// Hash a password with a fresh random salt. Two calls with the same input produce
/// different digests.
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| PasswordHashError::Salt(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordHashError::Salt(e.to_string()))?;
    let digest = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordHashError::Hash(e.to_string()))?;
    Ok(digest.to_string())
}

/// Verify a password against a stored digest.
///
/// A digest that does not parse as a PHC string verifies as `false` rather than erroring;
/// a corrupt row behaves like a wrong password instead of taking the login path down.
pub fn verify_password(password: &str, digest: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}
