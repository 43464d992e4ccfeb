//! [`BackingStore`] implementation over PostgreSQL.

use assetflow_core::asset::Asset;
use assetflow_core::error::{AppendNotificationError, CoreError, FetchError};
use assetflow_core::notification::NotificationRecord;
use assetflow_core::request::AssetRequest;
use assetflow_core::store::{AssetFilter, BackingStore, RequestFilter, Subscription, Table};
use assetflow_core::types::DbId;
use async_trait::async_trait;

use crate::listener;
use crate::repositories::{AssetRepo, AssetRequestRepo, NotificationRepo};
use crate::DbPool;

/// Backing store that reads and writes the assetflow tables through sqlx.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl BackingStore for PgStore {
    async fn list_assets(&self, filter: &AssetFilter) -> Result<Vec<Asset>, FetchError> {
        let status = filter.status.as_ref().map(|s| s.as_str());
        let rows = AssetRepo::list(&self.pool, status)
            .await
            .map_err(|e| fetch_error("asset", e))?;

        Ok(convert_rows("asset", rows, |row| row.id))
    }

    async fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<AssetRequest>, FetchError> {
        let rows = AssetRequestRepo::list(&self.pool, filter.employee_id)
            .await
            .map_err(|e| fetch_error("asset_request", e))?;

        Ok(convert_rows("asset_request", rows, |row| row.id))
    }

    async fn subscribe(&self, table: Table) -> Result<Subscription, FetchError> {
        listener::subscribe(&self.pool, table).await
    }

    async fn append_notification(
        &self,
        record: &NotificationRecord,
    ) -> Result<(), AppendNotificationError> {
        NotificationRepo::create(&self.pool, record)
            .await
            .map(|id| {
                tracing::debug!(notification_id = id, "Notification stored");
            })
            .map_err(|e| AppendNotificationError::new("store", e.to_string()))
    }
}

/// Convert fetched rows into entities, skipping rows that fail validation.
///
/// A skipped row is logged with its id and the reason, so one bad record
/// cannot stall every refresh of the table.
pub(crate) fn convert_rows<R, T>(
    entity: &'static str,
    rows: Vec<R>,
    id: impl Fn(&R) -> DbId,
) -> Vec<T>
where
    T: TryFrom<R, Error = CoreError>,
{
    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let row_id = id(&row);
        match T::try_from(row) {
            Ok(item) => items.push(item),
            Err(e) => {
                tracing::warn!(entity, id = row_id, error = %e, "Skipping malformed row");
            }
        }
    }
    items
}

/// Classify a sqlx error into the fetch error taxonomy.
///
/// - Connection, TLS and pool failures are `Network`.
/// - Decode failures are `Malformed` for the given entity.
/// - Everything else is `Backend`.
pub(crate) fn fetch_error(entity: &'static str, err: sqlx::Error) -> FetchError {
    match &err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => FetchError::Network(err.to_string()),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => FetchError::Malformed {
            entity,
            reason: err.to_string(),
        },
        _ => FetchError::Backend(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;
    use crate::models::asset::AssetRow;

    fn asset_row(id: DbId, name: &str) -> AssetRow {
        AssetRow {
            id,
            name: name.into(),
            code: format!("LT-{id:03}"),
            serial_number: None,
            category: None,
            asset_type: None,
            condition: None,
            location: None,
            description: None,
            image_url: None,
            status: "available".into(),
            updated_at: chrono::Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let rows = vec![asset_row(1, "Laptop"), asset_row(2, "  "), asset_row(3, "Phone")];

        let assets: Vec<Asset> = convert_rows("asset", rows, |row| row.id);

        let ids: Vec<DbId> = assets.iter().map(|a| a.asset_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn all_malformed_rows_give_an_empty_list() {
        let rows = vec![asset_row(0, "Laptop")];
        let assets: Vec<Asset> = convert_rows("asset", rows, |row| row.id);
        assert!(assets.is_empty());
    }

    #[test]
    fn pool_errors_are_network() {
        assert_matches!(fetch_error("asset", sqlx::Error::PoolTimedOut), FetchError::Network(_));
        assert_matches!(fetch_error("asset", sqlx::Error::PoolClosed), FetchError::Network(_));
    }

    #[test]
    fn row_not_found_is_backend() {
        assert_matches!(
            fetch_error("asset_request", sqlx::Error::RowNotFound),
            FetchError::Backend(_)
        );
    }

    #[test]
    fn decode_errors_are_malformed() {
        let err = sqlx::Error::Decode("bad timestamp".into());
        assert_matches!(
            fetch_error("asset", err),
            FetchError::Malformed { entity: "asset", .. }
        );
    }
}
