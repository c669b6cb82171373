//! Credential digests for accounts
//!
//! Secrets are stored only as Argon2id PHC strings and compared through the
//! verifier, never in plaintext.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

use crate::error::AuthError;

/// Hash a secret into an Argon2id PHC string.
pub fn digest_secret(secret: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let digest = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| AuthError::DigestFailure(e.to_string()))?
        .to_string();
    Ok(digest)
}

/// Verify a secret attempt against a stored digest.
pub fn verify_secret(attempt: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };
    Argon2::default()
        .verify_password(attempt.as_bytes(), &parsed)
        .is_ok()
}
