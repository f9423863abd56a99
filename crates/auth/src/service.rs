//! Registration, login, refresh, and password reset.

use chrono::Utc;
use common::UserId;
use domain::{RepositoryError, User, UserRepository, normalize_cpf};

use crate::password::{hash_password, verify_password};
use crate::{AuthError, AuthToken, TokenService};

/// Service for authenticating users.
///
/// Every successful login, registration, or refresh stores a new refresh
/// token on the user, invalidating the previous one.
pub struct AuthService<S: UserRepository> {
    store: S,
    tokens: TokenService,
}

impl<S: UserRepository> AuthService<S> {
    /// Creates a new auth service.
    pub fn new(store: S, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    /// Registers a new user and logs them in.
    #[tracing::instrument(skip(self, password))]
    pub async fn register(&self, cpf: &str, password: &str) -> Result<AuthToken, AuthError> {
        let cpf = normalize_cpf(cpf);
        if self.store.find_user_by_cpf(&cpf).await?.is_some() {
            return Err(AuthError::DuplicateIdentifier);
        }

        let user = User::new(&cpf, hash_password(password)?, Utc::now());
        let user = self.store.add_user(user).await.map_err(|err| match err {
            RepositoryError::Duplicate { .. } => AuthError::DuplicateIdentifier,
            other => AuthError::Repository(other),
        })?;

        tracing::info!(user_id = %user.id, "user registered");
        self.issue(user).await
    }

    /// Logs a user in with CPF and password.
    #[tracing::instrument(skip(self, password))]
    pub async fn authenticate(&self, cpf: &str, password: &str) -> Result<AuthToken, AuthError> {
        let result = self.check_credentials(&normalize_cpf(cpf), password).await;
        match result {
            Ok(user) => {
                metrics::counter!("auth_logins_total").increment(1);
                self.issue(user).await
            }
            Err(err) => {
                metrics::counter!("auth_failures_total").increment(1);
                tracing::warn!(error = %err, "login rejected");
                Err(err)
            }
        }
    }

    /// Exchanges a (possibly expired) access token and the current refresh
    /// token for a new pair.
    #[tracing::instrument(skip_all)]
    pub async fn refresh(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<AuthToken, AuthError> {
        let user_id = self
            .tokens
            .validate_signature(access_token)
            .ok_or(AuthError::InvalidRefresh)?;

        let user = self
            .store
            .get_user(user_id)
            .await?
            .filter(|user| user.refresh_token_matches(refresh_token, Utc::now()))
            .ok_or(AuthError::InvalidRefresh)?;

        self.issue(user).await
    }

    /// Replaces a user's password.
    #[tracing::instrument(skip(self, new_password))]
    pub async fn reset_password(&self, cpf: &str, new_password: &str) -> Result<bool, AuthError> {
        let mut user = self
            .store
            .find_user_by_cpf(&normalize_cpf(cpf))
            .await?
            .ok_or(AuthError::UserNotFound)?;

        user.password_hash = hash_password(new_password)?;
        self.store.update_user(user).await?;
        tracing::info!("password reset");
        Ok(true)
    }

    /// Returns the user ID of a valid access token.
    pub fn validate_token(&self, token: &str) -> Option<UserId> {
        self.tokens.validate(token)
    }

    async fn check_credentials(&self, cpf: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .store
            .find_user_by_cpf(cpf)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(&user.password_hash, password)? {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(user)
    }

    async fn issue(&self, mut user: User) -> Result<AuthToken, AuthError> {
        let now = Utc::now();
        let token = self.tokens.generate(&user, now)?;

        user.refresh_token = Some(token.refresh_token.clone());
        user.refresh_token_expires_at = Some(now + self.tokens.settings().refresh_lifetime());
        self.store.update_user(user).await?;

        Ok(token)
    }
}
