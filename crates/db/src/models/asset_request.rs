//! Asset request row model.

use assetflow_core::error::CoreError;
use assetflow_core::request::{AssetRequest, RequestStatus};
use assetflow_core::types::{DbId, Timestamp};
use assetflow_core::validation::{optional_text, require_id};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from `asset_requests`, joined with the asset and employee names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AssetRequestRow {
    pub id: DbId,
    pub employee_id: DbId,
    pub asset_id: DbId,
    pub request_date: Timestamp,
    pub purpose: Option<String>,
    pub destination: Option<String>,
    pub expected_return_date: Option<NaiveDate>,
    pub status: String,
    pub approver_id: Option<DbId>,
    pub approval_date: Option<Timestamp>,
    pub rejection_reason: Option<String>,
    pub return_date: Option<Timestamp>,
    pub return_condition: Option<String>,
    pub asset_name: Option<String>,
    pub employee_name: Option<String>,
}

/// DTO for submitting a new request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAssetRequest {
    pub employee_id: DbId,
    pub asset_id: DbId,
    pub purpose: Option<String>,
    pub destination: Option<String>,
    pub expected_return_date: Option<NaiveDate>,
}

impl TryFrom<AssetRequestRow> for AssetRequest {
    type Error = CoreError;

    fn try_from(row: AssetRequestRow) -> Result<Self, Self::Error> {
        Ok(AssetRequest {
            request_id: require_id("asset_request", "id", row.id)?,
            employee_id: require_id("asset_request", "employee_id", row.employee_id)?,
            asset_id: require_id("asset_request", "asset_id", row.asset_id)?,
            request_date: row.request_date,
            purpose: optional_text(row.purpose),
            destination: optional_text(row.destination),
            expected_return_date: row.expected_return_date,
            status: RequestStatus::parse(&row.status),
            approver_id: row.approver_id,
            approval_date: row.approval_date,
            rejection_reason: optional_text(row.rejection_reason),
            return_date: row.return_date,
            return_condition: optional_text(row.return_condition),
            asset_name: optional_text(row.asset_name),
            employee_name: optional_text(row.employee_name),
        })
    }
}
