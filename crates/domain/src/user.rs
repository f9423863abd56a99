//! Registered users and CPF handling.

use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Taxpayer number, digits only.
    pub cpf: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub refresh_token: Option<String>,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a user; the CPF is stored without its mask.
    pub fn new(cpf: &str, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            cpf: normalize_cpf(cpf),
            password_hash,
            refresh_token: None,
            refresh_token_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if `token` matches the stored refresh token and has not expired.
    ///
    /// The token bytes are compared in constant time.
    pub fn refresh_token_matches(&self, token: &str, now: DateTime<Utc>) -> bool {
        match (&self.refresh_token, self.refresh_token_expires_at) {
            (Some(stored), Some(expires_at)) => {
                bool::from(stored.as_bytes().ct_eq(token.as_bytes())) && expires_at > now
            }
            _ => false,
        }
    }
}

/// Strips everything but ASCII digits (`123.456.789-09` -> `12345678909`).
pub fn normalize_cpf(cpf: &str) -> String {
    cpf.chars().filter(char::is_ascii_digit).collect()
}

/// Validates a CPF's length and both mod-11 check digits.
///
/// Masked input is accepted. Sequences of a single repeated digit are rejected
/// even though they satisfy the checksum.
pub fn is_valid_cpf(cpf: &str) -> bool {
    let digits: Vec<u32> = normalize_cpf(cpf)
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();

    if digits.len() != 11 || digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    let check_digit = |len: usize| {
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (len as u32 + 1 - i as u32))
            .sum();
        let remainder = sum % 11;
        if remainder < 2 { 0 } else { 11 - remainder }
    };

    check_digit(9) == digits[9] && check_digit(10) == digits[10]
}
