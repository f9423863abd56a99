//! Access and refresh token handling.

use chrono::{DateTime, Utc};
use common::UserId;
use domain::User;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{AuthError, JwtSettings};

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    /// User CPF.
    pub name: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Public view of the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub cpf: String,
}

/// Tokens returned by a successful register, login, or refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    pub expiration: DateTime<Utc>,
    pub refresh_token: String,
    pub user: UserSummary,
}

/// Issues and validates HS256 access tokens.
#[derive(Clone)]
pub struct TokenService {
    settings: JwtSettings,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    /// Creates a token service from signing settings.
    pub fn new(settings: JwtSettings) -> Self {
        let encoding_key = EncodingKey::from_secret(settings.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(settings.secret.as_bytes());
        Self {
            settings,
            encoding_key,
            decoding_key,
        }
    }

    pub fn settings(&self) -> &JwtSettings {
        &self.settings
    }

    /// Issues an access token and a fresh refresh token for a user.
    pub fn generate(&self, user: &User, now: DateTime<Utc>) -> Result<AuthToken, AuthError> {
        let expiration = now + self.settings.expiration();
        let claims = Claims {
            sub: user.id.to_string(),
            name: user.cpf.clone(),
            iss: self.settings.issuer.clone(),
            aud: self.settings.audience.clone(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        let access_token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(AuthToken {
            access_token,
            expiration,
            refresh_token: generate_refresh_token(),
            user: UserSummary {
                id: user.id,
                cpf: user.cpf.clone(),
            },
        })
    }

    /// Returns the user ID of a valid, unexpired access token.
    pub fn validate(&self, token: &str) -> Option<UserId> {
        self.decode(token, true)
    }

    /// Returns the user ID of a correctly signed token, expired or not.
    ///
    /// Used by refresh, where the access token is expected to have lapsed.
    pub fn validate_signature(&self, token: &str) -> Option<UserId> {
        self.decode(token, false)
    }

    fn decode(&self, token: &str, check_expiry: bool) -> Option<UserId> {
        if token.is_empty() {
            return None;
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.settings.issuer]);
        validation.set_audience(&[&self.settings.audience]);
        validation.leeway = 0;
        validation.validate_exp = check_expiry;
        if !check_expiry {
            validation.required_spec_claims.remove("exp");
        }

        match jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => data.claims.sub.parse().ok(),
            Err(err) => {
                tracing::debug!(error = %err, "token rejected");
                None
            }
        }
    }
}

/// Generates 32 random bytes, hex-encoded.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
