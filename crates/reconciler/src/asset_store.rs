//! Snapshots of the available-assets collection.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use assetflow_core::asset::Asset;
use assetflow_core::error::FetchError;
use assetflow_core::store::{AssetFilter, BackingStore};
use assetflow_core::types::DbId;

use crate::snapshot::{Collection, InFlight, Snapshot, SnapshotPair};

/// Result of a refresh call that did not fail.
#[derive(Debug, Clone)]
pub enum Refresh<T> {
    /// The fetch completed and the snapshots advanced to this collection.
    Advanced(Arc<Collection<T>>),
    /// Another refresh of the same store was already in flight; nothing was
    /// fetched.
    Coalesced,
}

/// Holds the previous and current snapshot of assets with status Available.
pub struct AssetStore {
    source: Arc<dyn BackingStore>,
    snapshots: RwLock<SnapshotPair<Asset>>,
    in_flight: InFlight,
    suppress_first_load: bool,
}

impl AssetStore {
    pub fn new(source: Arc<dyn BackingStore>, suppress_first_load: bool) -> Self {
        Self {
            source,
            snapshots: RwLock::new(SnapshotPair::default()),
            in_flight: InFlight::default(),
            suppress_first_load,
        }
    }

    /// Fetch the available assets and advance the snapshots.
    ///
    /// On error both snapshots are left exactly as they were.
    pub async fn refresh(&self) -> Result<Refresh<Asset>, FetchError> {
        let Some(_guard) = self.in_flight.try_begin() else {
            tracing::debug!("Asset refresh already in flight, coalescing");
            return Ok(Refresh::Coalesced);
        };

        let mut fetched = self.source.list_assets(&AssetFilter::available()).await?;
        fetched.retain(Asset::is_available);

        let collection = Arc::new(Collection::from_items(fetched));
        self.write().advance(Arc::clone(&collection));

        tracing::debug!(count = collection.len(), "Asset snapshot advanced");
        Ok(Refresh::Advanced(collection))
    }

    /// Assets present now that were not present in the previous snapshot.
    pub fn diff_newly_available(&self) -> Vec<Asset> {
        self.read().added(self.suppress_first_load)
    }

    /// Look up an asset in the current snapshot.
    pub fn get_by_id(&self, asset_id: DbId) -> Option<Asset> {
        self.read()
            .current()
            .loaded()
            .and_then(|c| c.get(asset_id).cloned())
    }

    pub fn current(&self) -> Snapshot<Asset> {
        self.read().current().clone()
    }

    pub fn previous(&self) -> Snapshot<Asset> {
        self.read().previous().clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.is_active()
    }

    fn read(&self) -> RwLockReadGuard<'_, SnapshotPair<Asset>> {
        self.snapshots.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SnapshotPair<Asset>> {
        self.snapshots.write().unwrap_or_else(|e| e.into_inner())
    }
}
