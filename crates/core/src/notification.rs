//! User-facing notification records produced by the reconciler.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/// How a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    /// String representation for display, logging, and database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A synthesized notification.
///
/// Built with [`NotificationRecord::new`] plus the `with_*` methods, then
/// handed to one or more sinks. Read state belongs to the sink from then on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub title: String,
    pub message: String,
    pub subtext: Option<String>,
    pub severity: Severity,
    pub is_read: bool,
    pub created_at: Timestamp,
    /// Employee the notification is addressed to.
    pub recipient_id: Option<DbId>,
}

impl NotificationRecord {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        created_at: Timestamp,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            subtext: None,
            severity,
            is_read: false,
            created_at,
            recipient_id: None,
        }
    }

    pub fn with_subtext(mut self, subtext: Option<String>) -> Self {
        self.subtext = subtext;
        self
    }

    pub fn with_recipient(mut self, employee_id: DbId) -> Self {
        self.recipient_id = Some(employee_id);
        self
    }
}
