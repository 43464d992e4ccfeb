//! Repository for the `asset_requests` table.

use assetflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::asset_request::{AssetRequestRow, CreateAssetRequest};

/// Select list joining the asset and employee display names.
const SELECT_JOINED: &str = "SELECT r.id, r.employee_id, r.asset_id, r.request_date, r.purpose, \
                             r.destination, r.expected_return_date, r.status, r.approver_id, \
                             r.approval_date, r.rejection_reason, r.return_date, \
                             r.return_condition, a.name AS asset_name, e.full_name AS employee_name \
                             FROM asset_requests r \
                             LEFT JOIN assets a ON a.id = r.asset_id \
                             LEFT JOIN employees e ON e.id = r.employee_id";

/// Provides read and workflow operations for asset requests.
pub struct AssetRequestRepo;

impl AssetRequestRepo {
    /// List requests, optionally restricted to one employee, newest first.
    pub async fn list(
        pool: &PgPool,
        employee_id: Option<DbId>,
    ) -> Result<Vec<AssetRequestRow>, sqlx::Error> {
        let query = format!(
            "{SELECT_JOINED} \
             WHERE ($1::BIGINT IS NULL OR r.employee_id = $1) \
             ORDER BY r.request_date DESC, r.id DESC"
        );
        sqlx::query_as::<_, AssetRequestRow>(&query)
            .bind(employee_id)
            .fetch_all(pool)
            .await
    }

    /// Find a request by id.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<AssetRequestRow>, sqlx::Error> {
        let query = format!("{SELECT_JOINED} WHERE r.id = $1");
        sqlx::query_as::<_, AssetRequestRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Submit a new request in `pending` status, returning the generated ID.
    pub async fn create(pool: &PgPool, input: &CreateAssetRequest) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO asset_requests \
                (employee_id, asset_id, purpose, destination, expected_return_date) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(input.employee_id)
        .bind(input.asset_id)
        .bind(&input.purpose)
        .bind(&input.destination)
        .bind(input.expected_return_date)
        .fetch_one(pool)
        .await
    }

    /// Record an approver's decision.
    ///
    /// Returns `true` if the request existed and was updated.
    pub async fn decide(
        pool: &PgPool,
        id: DbId,
        status: &str,
        approver_id: DbId,
        rejection_reason: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE asset_requests \
             SET status = $2, approver_id = $3, approval_date = NOW(), \
                 rejection_reason = $4, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(approver_id)
        .bind(rejection_reason)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set a request's status without touching the approval fields.
    pub async fn update_status(pool: &PgPool, id: DbId, status: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE asset_requests SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
