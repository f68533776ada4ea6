//! Payload checks run before any store mutation.

use serde_json::Value;

use crate::error::AppError;

/// A required text field: present and not blank. Returns the trimmed value.
pub fn required_text(value: Option<String>, message: &str) -> Result<String, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::InvalidInput(message.into())),
    }
}

/// A non-null column in a merge patch: absent/`null` means unchanged, blank is rejected.
pub fn patched_text(value: Option<String>, message: &str) -> Result<Option<String>, AppError> {
    value.map(|v| required_text(Some(v), message)).transpose()
}

/// Accepts a JSON integer or a string holding one.
pub fn integer(value: &Value, message: &str) -> Result<i64, AppError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| AppError::InvalidInput(message.into()))
}
