//! Asset requests: an employee asking to borrow or use an asset.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{status_key, DbId, Timestamp};

// ---------------------------------------------------------------------------
// RequestStatus
// ---------------------------------------------------------------------------

/// Status of an asset request.
///
/// Transition order is enforced by the backing store; the client accepts any
/// observed value, including ones it has no variant for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    InProgress,
    Returned,
    Cancelled,
    Other(String),
}

impl RequestStatus {
    /// String representation for display, logging, and database storage.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::InProgress => "in_progress",
            Self::Returned => "returned",
            Self::Cancelled => "cancelled",
            Self::Other(raw) => raw,
        }
    }

    /// Parse a backend status string. Never fails.
    pub fn parse(raw: &str) -> Self {
        match status_key(raw).as_str() {
            "pending" => Self::Pending,
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            "inprogress" => Self::InProgress,
            "returned" => Self::Returned,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Other(raw.trim().to_string()),
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RequestStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RequestStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

// ---------------------------------------------------------------------------
// AssetRequest
// ---------------------------------------------------------------------------

/// One employee's request for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRequest {
    pub request_id: DbId,
    pub employee_id: DbId,
    pub asset_id: DbId,
    pub request_date: Timestamp,
    pub purpose: Option<String>,
    pub destination: Option<String>,
    pub expected_return_date: Option<NaiveDate>,
    pub status: RequestStatus,
    pub approver_id: Option<DbId>,
    pub approval_date: Option<Timestamp>,
    pub rejection_reason: Option<String>,
    pub return_date: Option<Timestamp>,
    pub return_condition: Option<String>,
    /// Asset name resolved by the backing store, when it joined one in.
    pub asset_name: Option<String>,
    /// Requesting employee's display name, when the backing store joined one in.
    pub employee_name: Option<String>,
}

impl AssetRequest {
    /// Minimal request with every optional attribute unset.
    pub fn new(
        request_id: DbId,
        employee_id: DbId,
        asset_id: DbId,
        status: RequestStatus,
        request_date: Timestamp,
    ) -> Self {
        Self {
            request_id,
            employee_id,
            asset_id,
            request_date,
            purpose: None,
            destination: None,
            expected_return_date: None,
            status,
            approver_id: None,
            approval_date: None,
            rejection_reason: None,
            return_date: None,
            return_condition: None,
            asset_name: None,
            employee_name: None,
        }
    }

    pub fn with_asset_name(mut self, name: impl Into<String>) -> Self {
        self.asset_name = Some(name.into());
        self
    }

    pub fn with_employee_name(mut self, name: impl Into<String>) -> Self {
        self.employee_name = Some(name.into());
        self
    }

    pub fn with_rejection_reason(mut self, reason: impl Into<String>) -> Self {
        self.rejection_reason = Some(reason.into());
        self
    }
}

// ---------------------------------------------------------------------------
// RequestScope
// ---------------------------------------------------------------------------

/// Which requests a refresh covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestScope {
    /// Only the requests filed by this employee (employee app).
    Employee(DbId),
    /// Every request (admin views).
    All,
}

impl RequestScope {
    pub fn employee_id(&self) -> Option<DbId> {
        match self {
            Self::Employee(id) => Some(*id),
            Self::All => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_backend_spellings() {
        assert_eq!(RequestStatus::parse("Pending"), RequestStatus::Pending);
        assert_eq!(RequestStatus::parse("In Progress"), RequestStatus::InProgress);
        assert_eq!(RequestStatus::parse("in_progress"), RequestStatus::InProgress);
        assert_eq!(RequestStatus::parse("Canceled"), RequestStatus::Cancelled);
        assert_eq!(RequestStatus::parse("Returned"), RequestStatus::Returned);
    }

    #[test]
    fn unknown_status_is_kept_verbatim() {
        let status = RequestStatus::parse("OnHold");
        assert_eq!(status, RequestStatus::Other("OnHold".to_string()));
        assert_eq!(status.to_string(), "OnHold");
    }

    #[test]
    fn serde_uses_canonical_strings() {
        let json = serde_json::to_string(&RequestStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let parsed: RequestStatus = serde_json::from_str("\"Approved\"").unwrap();
        assert_eq!(parsed, RequestStatus::Approved);
    }

    #[test]
    fn scope_employee_id() {
        assert_eq!(RequestScope::Employee(4).employee_id(), Some(4));
        assert_eq!(RequestScope::All.employee_id(), None);
        assert!(RequestScope::All.is_admin());
    }
}
