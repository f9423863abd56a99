//! Request extractors.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use common::UserId;

use crate::error::ApiError;
use crate::{AppState, Store};

/// The user authenticated by the request's bearer token.
///
/// Rejects with 401 when the `Authorization` header is missing, is not a
/// bearer token, or carries an invalid or expired token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl<S: Store> FromRequestParts<Arc<AppState<S>>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

        state
            .auth
            .validate_token(token)
            .map(AuthUser)
            .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_string()))
    }
}
