//! Common validation utilities.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Number of digits a contact phone number must have.
pub const PHONE_DIGITS: usize = 10;

lazy_static! {
    static ref PHONE_REGEX: Regex = Regex::new(&format!("^[0-9]{{{}}}$", PHONE_DIGITS)).unwrap();
}

/// Returns true when the value is empty or contains only whitespace.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Validates that a value is present after trimming surrounding whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if is_blank(value) {
        let mut err = ValidationError::new("required");
        err.message = Some("This field is required".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates that a phone number is exactly ten ASCII digits.
///
/// No separators, country prefix or surrounding whitespace are accepted.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE_REGEX.is_match(phone) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_format");
        err.message = Some("Phone number must be exactly 10 digits".into());
        Err(err)
    }
}
