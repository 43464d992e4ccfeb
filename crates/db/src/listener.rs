//! Realtime change feed over PostgreSQL LISTEN/NOTIFY.
//!
//! The `notify_assetflow_change` trigger publishes a JSON payload
//! `{"table": ..., "op": ..., "id": ...}` on [`CHANGE_CHANNEL`] for every row
//! change on `assets` and `asset_requests`. [`subscribe`] opens a dedicated
//! listener connection and forwards the events for one table into a
//! [`Subscription`].

use std::time::Duration;

use assetflow_core::error::FetchError;
use assetflow_core::store::{ChangeEvent, ChangeKind, Subscription, Table};
use assetflow_core::types::DbId;
use serde::Deserialize;
use sqlx::postgres::PgListener;
use tokio::sync::mpsc;

use crate::store::fetch_error;
use crate::DbPool;

/// Channel name used by the change-notify trigger.
pub const CHANGE_CHANNEL: &str = "assetflow_changes";

/// Buffered change events per subscription before the forwarder waits.
const FEED_CAPACITY: usize = 64;

/// Pause after a listener error before polling it again.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ChangePayload {
    table: String,
    op: String,
    id: Option<DbId>,
}

/// Parse a trigger payload. Returns `None` for unknown tables or operations.
pub fn parse_payload(raw: &str) -> Option<ChangeEvent> {
    let payload: ChangePayload = serde_json::from_str(raw).ok()?;
    let table = Table::parse(&payload.table)?;
    let kind = match payload.op.to_ascii_uppercase().as_str() {
        "INSERT" => ChangeKind::Insert,
        "UPDATE" => ChangeKind::Update,
        "DELETE" => ChangeKind::Delete,
        _ => return None,
    };
    Some(ChangeEvent {
        table,
        kind,
        record_id: payload.id,
    })
}

/// Open a change feed for `table`.
///
/// The forwarding task lives as long as the returned [`Subscription`].
pub async fn subscribe(pool: &DbPool, table: Table) -> Result<Subscription, FetchError> {
    let mut listener = PgListener::connect_with(pool)
        .await
        .map_err(|e| fetch_error("change feed", e))?;
    listener
        .listen(CHANGE_CHANNEL)
        .await
        .map_err(|e| fetch_error("change feed", e))?;

    let (tx, rx) = mpsc::channel(FEED_CAPACITY);
    let task = tokio::spawn(forward(listener, table, tx));

    tracing::info!(%table, channel = CHANGE_CHANNEL, "Realtime change feed opened");
    Ok(Subscription::new(table, rx).with_task(task))
}

/// Forward notifications for `table` until the subscriber goes away.
///
/// `PgListener` reconnects on the next `recv` after a connection loss;
/// notifications sent while disconnected are lost, which the periodic
/// refresh covers.
async fn forward(mut listener: PgListener, table: Table, tx: mpsc::Sender<ChangeEvent>) {
    loop {
        match listener.recv().await {
            Ok(notification) => {
                let Some(event) = parse_payload(notification.payload()) else {
                    tracing::warn!(
                        payload = notification.payload(),
                        "Ignoring malformed change notification"
                    );
                    continue;
                };
                if event.table != table {
                    continue;
                }
                if tx.send(event).await.is_err() {
                    tracing::debug!(%table, "Change feed subscriber dropped");
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, %table, "Change feed connection lost, reconnecting");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trigger_payload() {
        let event = parse_payload(r#"{"table":"asset_requests","op":"UPDATE","id":42}"#).unwrap();
        assert_eq!(event.table, Table::AssetRequests);
        assert_eq!(event.kind, ChangeKind::Update);
        assert_eq!(event.record_id, Some(42));
    }

    #[test]
    fn delete_payload() {
        let event = parse_payload(r#"{"table":"assets","op":"DELETE","id":7}"#).unwrap();
        assert_eq!(event.kind, ChangeKind::Delete);
    }

    #[test]
    fn unknown_table_is_ignored() {
        assert!(parse_payload(r#"{"table":"employees","op":"INSERT","id":1}"#).is_none());
    }

    #[test]
    fn unknown_op_is_ignored() {
        assert!(parse_payload(r#"{"table":"assets","op":"TRUNCATE","id":null}"#).is_none());
    }

    #[test]
    fn garbage_is_ignored() {
        assert!(parse_payload("not json").is_none());
    }
}
