#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use assetflow_core::asset::{Asset, AssetStatus};
use assetflow_core::identity::{CallerIdentity, SessionIdentity};
use assetflow_core::request::{AssetRequest, RequestStatus};
use assetflow_core::types::{DbId, Timestamp};
use assetflow_reconciler::{MemoryStore, Reconciler, ReconcilerBuilder, ReconcilerConfig};
use chrono::TimeZone;

pub const EMPLOYEE_ID: DbId = 7;
pub const OTHER_EMPLOYEE_ID: DbId = 8;
pub const ADMIN_ID: DbId = 1;

/// Fixed clock for deterministic `created_at`.
pub fn fixed_now() -> Timestamp {
    chrono::Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

pub fn asset(id: DbId, name: &str) -> Asset {
    Asset::new(id, name, format!("AS-{id:03}"), AssetStatus::Available, fixed_now())
}

pub fn request(id: DbId, employee_id: DbId, asset_id: DbId, asset_name: &str) -> AssetRequest {
    AssetRequest::new(id, employee_id, asset_id, RequestStatus::Pending, fixed_now())
        .with_asset_name(asset_name)
}

/// A store plus a builder wired to it for `caller`, using the fixed clock.
pub fn builder_for(
    caller: CallerIdentity,
) -> (Arc<MemoryStore>, Arc<SessionIdentity>, ReconcilerBuilder) {
    let store = Arc::new(MemoryStore::new());
    let identity = Arc::new(SessionIdentity::new(Some(caller)));
    let builder = Reconciler::builder(store.clone(), identity.clone())
        .config(ReconcilerConfig::default().with_realtime(false))
        .clock(fixed_now);
    (store, identity, builder)
}

pub fn employee_reconciler() -> (Arc<MemoryStore>, Reconciler) {
    let (store, _, builder) = builder_for(CallerIdentity::employee(EMPLOYEE_ID));
    (store, builder.build())
}

pub fn admin_reconciler() -> (Arc<MemoryStore>, Reconciler) {
    let (store, _, builder) = builder_for(CallerIdentity::admin(ADMIN_ID));
    (store, builder.build())
}

/// Poll `condition` until it holds or a second passes.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
