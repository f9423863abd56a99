//! Registration, login, token refresh, and password reset.

use std::sync::Arc;

use auth::{AuthError, AuthToken};
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::validation;
use crate::{AppState, Store};

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub cpf: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub cpf: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// POST /auth/register
#[tracing::instrument(skip_all)]
pub async fn register<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<AuthToken>, ApiError> {
    let Json(req) = payload?;
    let cpf = validation::cpf(&req.cpf)?;
    let password = validation::password(&req.password, "password")?;

    Ok(Json(state.auth.register(cpf, password).await?))
}

/// POST /auth/login
#[tracing::instrument(skip_all)]
pub async fn login<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<AuthToken>, ApiError> {
    let Json(req) = payload?;
    let cpf = validation::required(&req.cpf, "cpf")?;
    let password = validation::required(&req.password, "password")?;

    Ok(Json(state.auth.authenticate(cpf, password).await?))
}

/// POST /auth/refresh
#[tracing::instrument(skip_all)]
pub async fn refresh<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<AuthToken>, ApiError> {
    let Json(req) = payload?;
    let access_token = validation::required(&req.access_token, "access_token")?;
    let refresh_token = validation::required(&req.refresh_token, "refresh_token")?;

    Ok(Json(state.auth.refresh(access_token, refresh_token).await?))
}

/// POST /auth/reset-password
#[tracing::instrument(skip_all)]
pub async fn reset_password<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    let cpf = validation::required(&req.cpf, "cpf")?;
    let new_password = validation::password(&req.new_password, "new_password")?;

    state
        .auth
        .reset_password(cpf, new_password)
        .await
        .map_err(|err| match err {
            AuthError::UserNotFound => ApiError::BadRequest(err.to_string()),
            other => other.into(),
        })?;
    Ok(Json(MessageResponse {
        message: "Password reset successfully",
    }))
}
