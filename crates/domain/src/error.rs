//! Domain error types.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::order::OrderError;
use crate::repository::RepositoryError;

/// Coarse classification shared by every error the service layer raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Order, product, item or user absent.
    NotFound,
    /// The order's status forbids the operation.
    InvalidTransition,
    /// Input rejected before touching state.
    Validation,
    /// Concurrent modification or duplicate key.
    Conflict,
    /// Credentials or tokens rejected.
    Unauthorized,
    /// Anything unexpected.
    Internal,
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the order lifecycle.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// An error occurred in the product catalog.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// An error occurred in the repository.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl DomainError {
    /// Classifies the error for callers that map it onto a transport.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Order(err) => err.kind(),
            DomainError::Catalog(err) => err.kind(),
            DomainError::Repository(err) => repository_kind(err),
        }
    }
}

/// Classifies a repository error.
pub fn repository_kind(err: &RepositoryError) -> ErrorKind {
    match err {
        RepositoryError::NotFound { .. } => ErrorKind::NotFound,
        RepositoryError::Conflict { .. } | RepositoryError::Duplicate { .. } => {
            ErrorKind::Conflict
        }
        RepositoryError::Backend(_) => ErrorKind::Internal,
    }
}
