//! Authentication for the order management service.
//!
//! Users register and log in with a CPF and password. Successful
//! authentication yields a short-lived HS256 access token plus a refresh token
//! stored on the user and rotated on every use.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use config::JwtSettings;
pub use error::AuthError;
pub use service::AuthService;
pub use token::{AuthToken, Claims, TokenService, UserSummary};
