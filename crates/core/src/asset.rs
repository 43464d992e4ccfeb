//! Asset entity and its server-reported status.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{status_key, DbId, Timestamp};

// ---------------------------------------------------------------------------
// AssetStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of an asset as reported by the backing store.
///
/// The client never derives a status. Values it does not know are kept
/// verbatim in [`AssetStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetStatus {
    Available,
    Assigned,
    Stolen,
    Deleted,
    Other(String),
}

impl AssetStatus {
    /// String representation for display, logging, and database storage.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Available => "available",
            Self::Assigned => "assigned",
            Self::Stolen => "stolen",
            Self::Deleted => "deleted",
            Self::Other(raw) => raw,
        }
    }

    /// Parse a backend status string. Never fails.
    pub fn parse(raw: &str) -> Self {
        match status_key(raw).as_str() {
            "available" => Self::Available,
            "assigned" => Self::Assigned,
            "stolen" => Self::Stolen,
            "deleted" => Self::Deleted,
            _ => Self::Other(raw.trim().to_string()),
        }
    }
}

impl std::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AssetStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AssetStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// A physical or software item owned by the organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub asset_id: DbId,
    pub name: String,
    /// Human-readable tag printed on the item.
    pub code: String,
    pub serial_number: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub condition: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub status: AssetStatus,
    pub updated_at: Timestamp,
}

impl Asset {
    /// Minimal asset with every optional attribute unset.
    pub fn new(
        asset_id: DbId,
        name: impl Into<String>,
        code: impl Into<String>,
        status: AssetStatus,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            asset_id,
            name: name.into(),
            code: code.into(),
            serial_number: None,
            category: None,
            asset_type: None,
            condition: None,
            location: None,
            description: None,
            image_url: None,
            status,
            updated_at,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn is_available(&self) -> bool {
        self.status == AssetStatus::Available
    }
}
