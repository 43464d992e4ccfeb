//! Asset row model.

use assetflow_core::asset::{Asset, AssetStatus};
use assetflow_core::error::CoreError;
use assetflow_core::types::{DbId, Timestamp};
use assetflow_core::validation::{optional_text, require_id, require_text};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `assets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AssetRow {
    pub id: DbId,
    pub name: String,
    pub code: String,
    pub serial_number: Option<String>,
    pub category: Option<String>,
    pub asset_type: Option<String>,
    pub condition: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub status: String,
    pub updated_at: Timestamp,
}

impl TryFrom<AssetRow> for Asset {
    type Error = CoreError;

    fn try_from(row: AssetRow) -> Result<Self, Self::Error> {
        Ok(Asset {
            asset_id: require_id("asset", "id", row.id)?,
            name: require_text("asset", "name", row.name)?,
            code: require_text("asset", "code", row.code)?,
            serial_number: optional_text(row.serial_number),
            category: optional_text(row.category),
            asset_type: optional_text(row.asset_type),
            condition: optional_text(row.condition),
            location: optional_text(row.location),
            description: optional_text(row.description),
            image_url: optional_text(row.image_url),
            status: AssetStatus::parse(&row.status),
            updated_at: row.updated_at,
        })
    }
}
