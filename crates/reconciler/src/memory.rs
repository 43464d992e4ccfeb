//! In-process [`BackingStore`] for tests and local development.
//!
//! Holds assets, requests and appended notifications in memory, emits change
//! events on every mutation, and exposes a few knobs for exercising failure
//! paths: one-shot fetch failures, persistent append failures, and a gate
//! that holds fetches open until released.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use assetflow_core::asset::{Asset, AssetStatus};
use assetflow_core::error::{AppendNotificationError, CoreError, FetchError};
use assetflow_core::notification::NotificationRecord;
use assetflow_core::request::{AssetRequest, RequestStatus};
use assetflow_core::store::{
    AssetFilter, BackingStore, ChangeEvent, ChangeKind, RequestFilter, Subscription, Table,
};
use assetflow_core::types::DbId;
use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, watch};

/// Buffer for each subscription's channel.
const SUBSCRIPTION_BUFFER: usize = 64;

#[derive(Default)]
struct State {
    assets: Vec<Asset>,
    requests: Vec<AssetRequest>,
    notifications: Vec<NotificationRecord>,
    fail_next_assets: Option<FetchError>,
    fail_next_requests: Option<FetchError>,
    fail_subscribe: Option<FetchError>,
    fail_appends: Option<String>,
    last_request_filter: Option<RequestFilter>,
}

pub struct MemoryStore {
    state: Mutex<State>,
    /// `true` while fetches may proceed.
    gate: watch::Sender<bool>,
    changes: broadcast::Sender<ChangeEvent>,
    asset_fetches: AtomicUsize,
    request_fetches: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        let (changes, _) = broadcast::channel(256);
        Self {
            state: Mutex::new(State::default()),
            gate,
            changes,
            asset_fetches: AtomicUsize::new(0),
            request_fetches: AtomicUsize::new(0),
        }
    }

    // -- assets --------------------------------------------------------------

    /// Insert an asset, replacing any existing one with the same id.
    pub fn insert_asset(&self, asset: Asset) {
        let id = asset.asset_id;
        {
            let mut state = self.lock();
            match state.assets.iter_mut().find(|a| a.asset_id == id) {
                Some(existing) => *existing = asset,
                None => state.assets.push(asset),
            }
        }
        self.emit(Table::Assets, ChangeKind::Insert, id);
    }

    pub fn set_asset_status(&self, asset_id: DbId, status: AssetStatus) -> Result<(), CoreError> {
        {
            let mut state = self.lock();
            let asset = state
                .assets
                .iter_mut()
                .find(|a| a.asset_id == asset_id)
                .ok_or(CoreError::NotFound {
                    entity: "asset",
                    id: asset_id,
                })?;
            asset.status = status;
            asset.updated_at = chrono::Utc::now();
        }
        self.emit(Table::Assets, ChangeKind::Update, asset_id);
        Ok(())
    }

    /// Reverse the order assets are returned in.
    pub fn reverse_assets(&self) {
        self.lock().assets.reverse();
    }

    // -- requests ------------------------------------------------------------

    /// Insert a request, replacing any existing one with the same id.
    pub fn insert_request(&self, request: AssetRequest) {
        let id = request.request_id;
        {
            let mut state = self.lock();
            match state.requests.iter_mut().find(|r| r.request_id == id) {
                Some(existing) => *existing = request,
                None => state.requests.push(request),
            }
        }
        self.emit(Table::AssetRequests, ChangeKind::Insert, id);
    }

    pub fn set_request_status(
        &self,
        request_id: DbId,
        status: RequestStatus,
    ) -> Result<(), CoreError> {
        self.update_request(request_id, |r| r.status = status)
    }

    /// Apply `edit` to a stored request.
    pub fn update_request(
        &self,
        request_id: DbId,
        edit: impl FnOnce(&mut AssetRequest),
    ) -> Result<(), CoreError> {
        {
            let mut state = self.lock();
            let request = state
                .requests
                .iter_mut()
                .find(|r| r.request_id == request_id)
                .ok_or(CoreError::NotFound {
                    entity: "asset_request",
                    id: request_id,
                })?;
            edit(request);
        }
        self.emit(Table::AssetRequests, ChangeKind::Update, request_id);
        Ok(())
    }

    pub fn remove_request(&self, request_id: DbId) -> Result<(), CoreError> {
        {
            let mut state = self.lock();
            let before = state.requests.len();
            state.requests.retain(|r| r.request_id != request_id);
            if state.requests.len() == before {
                return Err(CoreError::NotFound {
                    entity: "asset_request",
                    id: request_id,
                });
            }
        }
        self.emit(Table::AssetRequests, ChangeKind::Delete, request_id);
        Ok(())
    }

    /// Filter passed to the most recent `list_requests` call.
    pub fn last_request_filter(&self) -> Option<RequestFilter> {
        self.lock().last_request_filter.clone()
    }

    // -- notifications -------------------------------------------------------

    /// Every notification appended so far, in append order.
    pub fn notifications(&self) -> Vec<NotificationRecord> {
        self.lock().notifications.clone()
    }

    /// Reject every append with `reason` until [`accept_appends`](Self::accept_appends).
    pub fn fail_appends(&self, reason: impl Into<String>) {
        self.lock().fail_appends = Some(reason.into());
    }

    pub fn accept_appends(&self) {
        self.lock().fail_appends = None;
    }

    // -- failure injection and pacing ----------------------------------------

    /// Fail the next `list_assets` call with `err`.
    pub fn fail_next_asset_fetch(&self, err: FetchError) {
        self.lock().fail_next_assets = Some(err);
    }

    /// Fail the next `list_requests` call with `err`.
    pub fn fail_next_request_fetch(&self, err: FetchError) {
        self.lock().fail_next_requests = Some(err);
    }

    /// Fail the next `subscribe` call with `err`.
    pub fn fail_next_subscribe(&self, err: FetchError) {
        self.lock().fail_subscribe = Some(err);
    }

    /// Hold every fetch after it has been counted until
    /// [`resume_fetches`](Self::resume_fetches).
    pub fn pause_fetches(&self) {
        self.gate.send_replace(false);
    }

    pub fn resume_fetches(&self) {
        self.gate.send_replace(true);
    }

    /// Number of `list_assets` calls started, including paused ones.
    pub fn asset_fetch_count(&self) -> usize {
        self.asset_fetches.load(Ordering::SeqCst)
    }

    /// Number of `list_requests` calls started, including paused ones.
    pub fn request_fetch_count(&self) -> usize {
        self.request_fetches.load(Ordering::SeqCst)
    }

    // -- internals -----------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, table: Table, kind: ChangeKind, record_id: DbId) {
        // No subscribers is fine.
        let _ = self.changes.send(ChangeEvent {
            table,
            kind,
            record_id: Some(record_id),
        });
    }

    async fn wait_for_gate(&self) {
        let mut gate = self.gate.subscribe();
        loop {
            let open = *gate.borrow_and_update();
            if open || gate.changed().await.is_err() {
                break;
            }
        }
    }
}

#[async_trait]
impl BackingStore for MemoryStore {
    async fn list_assets(&self, filter: &AssetFilter) -> Result<Vec<Asset>, FetchError> {
        self.asset_fetches.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;

        let mut state = self.lock();
        if let Some(err) = state.fail_next_assets.take() {
            return Err(err);
        }
        Ok(state
            .assets
            .iter()
            .filter(|a| filter.status.as_ref().map_or(true, |s| &a.status == s))
            .cloned()
            .collect())
    }

    async fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<AssetRequest>, FetchError> {
        self.request_fetches.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;

        let mut state = self.lock();
        state.last_request_filter = Some(filter.clone());
        if let Some(err) = state.fail_next_requests.take() {
            return Err(err);
        }
        Ok(state
            .requests
            .iter()
            .filter(|r| filter.employee_id.map_or(true, |id| r.employee_id == id))
            .cloned()
            .collect())
    }

    async fn subscribe(&self, table: Table) -> Result<Subscription, FetchError> {
        if let Some(err) = self.lock().fail_subscribe.take() {
            return Err(err);
        }

        let mut changes = self.changes.subscribe();
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let task = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(event) if event.table == table => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, %table, "Memory change feed lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Ok(Subscription::new(table, rx).with_task(task))
    }

    async fn append_notification(
        &self,
        record: &NotificationRecord,
    ) -> Result<(), AppendNotificationError> {
        let mut state = self.lock();
        if let Some(reason) = &state.fail_appends {
            return Err(AppendNotificationError::new("store", reason.clone()));
        }
        state.notifications.push(record.clone());
        Ok(())
    }
}
