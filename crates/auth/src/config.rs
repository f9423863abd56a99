//! Token signing settings.

use chrono::Duration;

/// How long a refresh token stays valid after issuance.
pub const REFRESH_TOKEN_LIFETIME_DAYS: i64 = 7;

/// Settings for signing and validating access tokens.
///
/// Loaded once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expiration_minutes: i64,
}

impl JwtSettings {
    /// Returns the access token lifetime.
    pub fn expiration(&self) -> Duration {
        Duration::minutes(self.expiration_minutes)
    }

    /// Returns the refresh token lifetime.
    pub fn refresh_lifetime(&self) -> Duration {
        Duration::days(REFRESH_TOKEN_LIFETIME_DAYS)
    }
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            secret: "development-secret-change-me-0123456789".to_string(),
            issuer: "order-management".to_string(),
            audience: "order-management-clients".to_string(),
            expiration_minutes: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifetimes() {
        let settings = JwtSettings {
            expiration_minutes: 15,
            ..Default::default()
        };
        assert_eq!(settings.expiration(), Duration::minutes(15));
        assert_eq!(settings.refresh_lifetime(), Duration::days(7));
    }
}
