//! Argon2id password hashing.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("password hashing failed")]
pub struct PasswordHashError;

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordHashError)
}

/// Verify a plaintext password against a stored hash.
///
/// A malformed stored hash verifies as false rather than erroring: from the
/// caller's point of view the credentials simply do not match.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("password1").unwrap();
        assert!(verify_password("password1", &hash));
        assert!(!verify_password("password2", &hash));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("password1").unwrap();
        let b = hash_password("password1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("password1", "not-a-phc-string"));
    }
}
