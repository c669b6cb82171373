use thiserror::Error;

/// Errors surfaced by account construction and login.
///
/// A wrong password on an account that is not yet locked is NOT an error:
/// `Account::login` returns `Ok(false)` in that case so callers can tell
/// "retry allowed" apart from "account unusable".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("password must be at least {minimum} characters")]
    PolicyViolation { minimum: usize },
    #[error("account locked after too many failed login attempts")]
    AccountLocked,
    #[error("application is in maintenance mode")]
    MaintenanceActive,
    /// Argon2 refused to hash the secret. Not reachable with the default
    /// parameters this crate uses.
    #[error("credential digest failed: {0}")]
    DigestFailure(String),
}
