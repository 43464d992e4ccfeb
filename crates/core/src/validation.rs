//! Field checks applied when backend rows are turned into typed entities.

use crate::error::CoreError;
use crate::types::DbId;

/// Reject ids that a BIGSERIAL column can never produce.
pub fn require_id(entity: &str, field: &str, id: DbId) -> Result<DbId, CoreError> {
    if id > 0 {
        Ok(id)
    } else {
        Err(CoreError::Validation(format!(
            "{entity}.{field} must be positive, got {id}"
        )))
    }
}

/// Trim a required text field and reject it when nothing is left.
pub fn require_text(entity: &str, field: &str, value: String) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!(
            "{entity}.{field} must not be empty"
        )));
    }
    if trimmed.len() == value.len() {
        Ok(value)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Collapse blank optional text to `None`.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
