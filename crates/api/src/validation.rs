//! Request validation applied before calling into the services.

use domain::{Money, is_valid_cpf};

use crate::error::ApiError;

pub const MAX_PRODUCT_NAME_LEN: usize = 100;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

fn invalid(msg: impl Into<String>) -> ApiError {
    ApiError::BadRequest(msg.into())
}

/// Parses a path segment into an identifier.
pub fn parse_id<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| invalid(format!("Invalid {what}: {raw}")))
}

/// Requires a non-empty value.
pub fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, ApiError> {
    if value.trim().is_empty() {
        return Err(invalid(format!("{field} is required")));
    }
    Ok(value)
}

/// Requires a CPF with valid check digits.
pub fn cpf(value: &str) -> Result<&str, ApiError> {
    required(value, "cpf")?;
    if !is_valid_cpf(value) {
        return Err(invalid("Invalid CPF"));
    }
    Ok(value)
}

/// Requires a password of at least `MIN_PASSWORD_LEN` characters.
pub fn password<'a>(value: &'a str, field: &str) -> Result<&'a str, ApiError> {
    required(value, field)?;
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid(format!(
            "{field} must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(value)
}

/// Validates a product name, returning it trimmed.
pub fn product_name(value: &str) -> Result<String, ApiError> {
    let name = value.trim();
    if name.is_empty() {
        return Err(invalid("Product name is required"));
    }
    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(invalid(format!(
            "Product name must be at most {MAX_PRODUCT_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

/// Requires a price greater than zero.
pub fn price(cents: i64) -> Result<Money, ApiError> {
    if cents <= 0 {
        return Err(invalid("Price must be greater than zero"));
    }
    Ok(Money::from_cents(cents))
}

/// Requires a positive quantity that fits in `u32`.
pub fn quantity(value: i64) -> Result<u32, ApiError> {
    u32::try_from(value)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| invalid("Quantity must be greater than zero"))
}

/// Resolves `page` and `page_size`, applying defaults.
pub fn pagination(page: Option<u32>, page_size: Option<u32>) -> Result<(u32, u32), ApiError> {
    let page = page.unwrap_or(1);
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if page == 0 {
        return Err(invalid("page must be at least 1"));
    }
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(invalid(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok((page, page_size))
}
