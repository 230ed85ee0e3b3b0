//! Input validation shared by the core modules.

use crate::errors::{Error, Result};
use chrono::NaiveDate;

/// Trims `value` and checks it is non-empty and at most `max_len` characters.
pub fn required_text(field: &str, value: &str, max_len: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{field} cannot be empty")));
    }
    if trimmed.chars().count() > max_len {
        return Err(Error::validation(format!(
            "{field} cannot be longer than {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Like [`required_text`] for optional fields; blank values become `None`.
pub fn optional_text(field: &str, value: Option<String>, max_len: usize) -> Result<Option<String>> {
    match value {
        Some(v) if !v.trim().is_empty() => required_text(field, &v, max_len).map(Some),
        _ => Ok(None),
    }
}

/// Requires `end` to be strictly after `start`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if end <= start {
        return Err(Error::validation(format!(
            "End date {end} must be after start date {start}"
        )));
    }
    Ok(())
}

/// Validates and upper-cases a 3-letter currency code.
pub fn currency_code(value: &str) -> Result<String> {
    let code = value.trim().to_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::validation(format!(
            "Currency '{value}' must be a 3-letter code"
        )));
    }
    Ok(code)
}
