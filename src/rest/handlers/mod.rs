pub mod orders;
pub mod stock;
pub mod suppliers;

use crate::rest::error::ApiError;

/// Trimmed `value`, or a 400 naming `field` when it is blank.
pub fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!("{field} is required")));
    }
    Ok(trimmed)
}

pub fn require_non_negative(field: &str, value: f64) -> Result<f64, ApiError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::BadRequest(format!("{field} must be a non-negative number")));
    }
    Ok(value)
}
