/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Identifier issued by the authentication provider for a signed-in user.
pub type AuthUserId = uuid::Uuid;

/// Canonical comparison key for a status string.
///
/// Backends spell statuses inconsistently (`"In Progress"`, `"in_progress"`,
/// `"InProgress"`), so matching is done on the lowercased string with spaces,
/// underscores and hyphens removed.
pub(crate) fn status_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}
