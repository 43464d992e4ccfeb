//! Snapshots of asset requests and status-transition detection.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use assetflow_core::error::FetchError;
use assetflow_core::request::{AssetRequest, RequestScope, RequestStatus};
use assetflow_core::store::{BackingStore, RequestFilter};
use assetflow_core::types::DbId;

use crate::asset_store::Refresh;
use crate::snapshot::{Collection, InFlight, Snapshot, SnapshotPair};

/// A request whose status differs between the previous and current snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub request_id: DbId,
    pub old_status: RequestStatus,
    pub new_status: RequestStatus,
    pub asset_id: DbId,
    pub employee_id: DbId,
    /// Asset display name, if known.
    pub asset_name: Option<String>,
    pub rejection_reason: Option<String>,
}

impl StatusChange {
    fn between(old: &AssetRequest, new: &AssetRequest) -> Self {
        Self {
            request_id: new.request_id,
            old_status: old.status.clone(),
            new_status: new.status.clone(),
            asset_id: new.asset_id,
            employee_id: new.employee_id,
            asset_name: new.asset_name.clone().or_else(|| old.asset_name.clone()),
            rejection_reason: new.rejection_reason.clone(),
        }
    }
}

struct ScopedSnapshots {
    scope: Option<RequestScope>,
    pair: SnapshotPair<AssetRequest>,
}

/// Holds the previous and current snapshot of the caller's requests (or all
/// requests, in admin scope).
pub struct RequestStore {
    source: Arc<dyn BackingStore>,
    snapshots: RwLock<ScopedSnapshots>,
    in_flight: InFlight,
    suppress_first_load: bool,
}

impl RequestStore {
    pub fn new(source: Arc<dyn BackingStore>, suppress_first_load: bool) -> Self {
        Self {
            source,
            snapshots: RwLock::new(ScopedSnapshots {
                scope: None,
                pair: SnapshotPair::default(),
            }),
            in_flight: InFlight::default(),
            suppress_first_load,
        }
    }

    /// Fetch requests for `scope` and advance the snapshots.
    ///
    /// When `scope` differs from the previous successful refresh the pair is
    /// reset first, so the new scope starts from the uninitialized sentinel.
    /// On error nothing changes.
    pub async fn refresh(&self, scope: RequestScope) -> Result<Refresh<AssetRequest>, FetchError> {
        let Some(_guard) = self.in_flight.try_begin() else {
            tracing::debug!("Request refresh already in flight, coalescing");
            return Ok(Refresh::Coalesced);
        };

        let fetched = self.source.list_requests(&RequestFilter::from(scope)).await?;
        let collection = Arc::new(Collection::from_items(fetched));

        {
            let mut state = self.write();
            if state.scope != Some(scope) {
                if let Some(old) = state.scope {
                    tracing::info!(?old, new = ?scope, "Request scope changed, resetting snapshots");
                }
                state.pair.reset();
                state.scope = Some(scope);
            }
            state.pair.advance(Arc::clone(&collection));
        }

        tracing::debug!(count = collection.len(), ?scope, "Request snapshot advanced");
        Ok(Refresh::Advanced(collection))
    }

    /// `(request, old status, new status)` for every request present in both
    /// snapshots whose status changed. Creation is not a transition.
    pub fn diff_status_changes(&self) -> Vec<StatusChange> {
        self.read()
            .pair
            .retained()
            .into_iter()
            .filter(|(old, new)| old.status != new.status)
            .map(|(old, new)| StatusChange::between(old, new))
            .collect()
    }

    /// Requests that were in the previous snapshot but are gone now.
    pub fn diff_disappeared(&self) -> Vec<AssetRequest> {
        self.read().pair.removed()
    }

    /// Requests that appeared since the previous snapshot.
    pub fn diff_submitted(&self) -> Vec<AssetRequest> {
        self.read().pair.added(self.suppress_first_load)
    }

    pub fn get_by_id(&self, request_id: DbId) -> Option<AssetRequest> {
        self.read()
            .pair
            .current()
            .loaded()
            .and_then(|c| c.get(request_id).cloned())
    }

    pub fn current(&self) -> Snapshot<AssetRequest> {
        self.read().pair.current().clone()
    }

    pub fn previous(&self) -> Snapshot<AssetRequest> {
        self.read().pair.previous().clone()
    }

    /// Scope of the last successful refresh.
    pub fn scope(&self) -> Option<RequestScope> {
        self.read().scope
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.is_active()
    }

    fn read(&self) -> RwLockReadGuard<'_, ScopedSnapshots> {
        self.snapshots.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ScopedSnapshots> {
        self.snapshots.write().unwrap_or_else(|e| e.into_inner())
    }
}
