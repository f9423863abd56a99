//! Authentication error types.

use domain::{ErrorKind, RepositoryError, repository_kind};
use thiserror::Error;

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No user is registered under the CPF.
    #[error("User not found")]
    UserNotFound,

    /// The password does not match.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A user with this CPF is already registered.
    #[error("CPF already registered")]
    DuplicateIdentifier,

    /// The access token or refresh token was rejected.
    #[error("Invalid or expired refresh token")]
    InvalidRefresh,

    /// Hashing or parsing a password hash failed.
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// Signing a token failed.
    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// An error occurred in the repository.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl AuthError {
    /// Classifies the error for callers that map it onto a transport.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::UserNotFound | AuthError::InvalidCredentials | AuthError::InvalidRefresh => {
                ErrorKind::Unauthorized
            }
            AuthError::DuplicateIdentifier => ErrorKind::Validation,
            AuthError::Hashing(_) | AuthError::Signing(_) => ErrorKind::Internal,
            AuthError::Repository(RepositoryError::Duplicate { .. }) => ErrorKind::Validation,
            AuthError::Repository(err) => repository_kind(err),
        }
    }
}
