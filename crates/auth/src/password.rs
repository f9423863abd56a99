//! Argon2 password hashing.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand_core::OsRng;
use tracing::{debug, error};

use crate::AuthError;

/// Hashes a plain-text password with Argon2 and a random salt.
///
/// Returns the PHC string representation of the hash.
#[tracing::instrument(skip(password))]
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| {
            error!(error = %err, "argon2 password hashing failed");
            AuthError::Hashing(err.to_string())
        })
}

/// Verifies a plain-text password against a stored Argon2 hash.
///
/// Returns `Ok(false)` on a mismatch; errors only when the stored hash is
/// unreadable or verification itself fails.
#[tracing::instrument(skip_all)]
pub fn verify_password(stored_hash: &str, password: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|err| {
        error!(error = %err, "stored password hash is malformed");
        AuthError::Hashing(err.to_string())
    })?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => {
            debug!("password mismatch");
            Ok(false)
        }
        Err(err) => Err(AuthError::Hashing(err.to_string())),
    }
}
