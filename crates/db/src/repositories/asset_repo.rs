//! Repository for the `assets` table.

use assetflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::asset::AssetRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, code, serial_number, category, asset_type, condition, \
                       location, description, image_url, status, updated_at";

/// Provides read and status-update operations for assets.
pub struct AssetRepo;

impl AssetRepo {
    /// List assets, optionally restricted to one status, ordered by id.
    ///
    /// `status` is compared case-insensitively so `"Available"` and
    /// `"available"` rows both match.
    pub async fn list(pool: &PgPool, status: Option<&str>) -> Result<Vec<AssetRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assets \
             WHERE ($1::TEXT IS NULL OR LOWER(status) = LOWER($1)) \
             ORDER BY id"
        );
        sqlx::query_as::<_, AssetRow>(&query)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// Find an asset by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<AssetRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assets WHERE id = $1");
        sqlx::query_as::<_, AssetRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Register a new asset, returning the generated ID.
    pub async fn create(
        pool: &PgPool,
        name: &str,
        code: &str,
        status: &str,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO assets (name, code, status) \
             VALUES ($1, $2, $3) \
             RETURNING id",
        )
        .bind(name)
        .bind(code)
        .bind(status)
        .fetch_one(pool)
        .await
    }

    /// Set an asset's status.
    ///
    /// Returns `true` if the asset existed and was updated.
    pub async fn update_status(pool: &PgPool, id: DbId, status: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE assets SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
