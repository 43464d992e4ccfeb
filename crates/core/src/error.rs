//! Error taxonomy shared by the store, reconciler and delivery layers.
//!
//! - [`CoreError`]: a row or entity failed validation.
//! - [`FetchError`]: a read from the backing store failed. Recoverable; the
//!   next refresh cycle retries.
//! - [`AuthError`]: there is no caller to act for. Cycles are skipped until a
//!   session exists.
//! - [`AppendNotificationError`]: a sink rejected a notification. Logged and
//!   dropped, never retried by the reconciler.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Failure to read a collection from the backing store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure (connection refused, pool timeout, DNS).
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered but reported an error.
    #[error("Backend error: {0}")]
    Backend(String),

    /// A row came back that could not be turned into a typed entity.
    #[error("Malformed {entity} row: {reason}")]
    Malformed {
        entity: &'static str,
        reason: String,
    },
}

impl FetchError {
    /// Wrap a [`CoreError`] raised while validating a fetched row.
    pub fn malformed(entity: &'static str, err: CoreError) -> Self {
        Self::Malformed {
            entity,
            reason: err.to_string(),
        }
    }
}

/// The caller could not be resolved to an employee.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Nobody is signed in.
    #[error("No active session")]
    NoSession,

    /// A session exists but no employee row is linked to it.
    #[error("No employee linked to the current session")]
    UnknownCaller,

    /// Identity lookup itself failed.
    #[error("Identity lookup failed: {0}")]
    Lookup(String),
}

/// A notification sink failed to accept a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Failed to append notification via {channel}: {reason}")]
pub struct AppendNotificationError {
    /// Sink name (`"store"`, `"in_app"`, `"email"`, `"webhook"`).
    pub channel: &'static str,
    pub reason: String,
}

impl AppendNotificationError {
    pub fn new(channel: &'static str, reason: impl Into<String>) -> Self {
        Self {
            channel,
            reason: reason.into(),
        }
    }
}
