//! Keyed collections and the previous/current snapshot pair.
//!
//! A [`Snapshot`] is either the [`Snapshot::Uninitialized`] sentinel (nothing
//! has been loaded yet) or a loaded [`Collection`]. The sentinel is distinct
//! from an empty collection: diffs against it are suppressed so the first
//! load does not report every entity as new.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use assetflow_core::asset::Asset;
use assetflow_core::request::AssetRequest;
use assetflow_core::types::DbId;

// ---------------------------------------------------------------------------
// Keyed
// ---------------------------------------------------------------------------

/// Entities with a stable server-assigned identity.
pub trait Keyed {
    fn key(&self) -> DbId;
}

impl Keyed for Asset {
    fn key(&self) -> DbId {
        self.asset_id
    }
}

impl Keyed for AssetRequest {
    fn key(&self) -> DbId {
        self.request_id
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// A fetched collection in server order with an id index.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    items: Vec<T>,
    index: HashMap<DbId, usize>,
}

impl<T: Keyed> Collection<T> {
    /// Build from fetched items. If the backend returns the same id twice the
    /// first occurrence wins.
    pub fn from_items(fetched: Vec<T>) -> Self {
        let mut items = Vec::with_capacity(fetched.len());
        let mut index = HashMap::with_capacity(fetched.len());
        for item in fetched {
            let key = item.key();
            if index.contains_key(&key) {
                tracing::warn!(id = key, "Duplicate id in fetched collection, keeping first");
                continue;
            }
            index.insert(key, items.len());
            items.push(item);
        }
        Self { items, index }
    }
}

impl<T> Collection<T> {
    pub fn get(&self, key: DbId) -> Option<&T> {
        self.index.get(&key).map(|&i| &self.items[i])
    }

    pub fn contains(&self, key: DbId) -> bool {
        self.index.contains_key(&key)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Snapshot / SnapshotPair
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Snapshot<T> {
    Uninitialized,
    Loaded(Arc<Collection<T>>),
}

impl<T> Snapshot<T> {
    pub fn loaded(&self) -> Option<&Arc<Collection<T>>> {
        match self {
            Self::Uninitialized => None,
            Self::Loaded(collection) => Some(collection),
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// The two most recent snapshots of one collection.
///
/// Only [`advance`](Self::advance) and [`reset`](Self::reset) mutate it, and
/// both replace whole snapshots.
#[derive(Debug)]
pub struct SnapshotPair<T> {
    previous: Snapshot<T>,
    current: Snapshot<T>,
}

impl<T> Default for SnapshotPair<T> {
    fn default() -> Self {
        Self {
            previous: Snapshot::Uninitialized,
            current: Snapshot::Uninitialized,
        }
    }
}

impl<T: Keyed + Clone> SnapshotPair<T> {
    pub fn previous(&self) -> &Snapshot<T> {
        &self.previous
    }

    pub fn current(&self) -> &Snapshot<T> {
        &self.current
    }

    /// `previous := current`, `current := next`.
    pub fn advance(&mut self, next: Arc<Collection<T>>) {
        self.previous = std::mem::replace(&mut self.current, Snapshot::Loaded(next));
    }

    /// Back to the uninitialized sentinel on both sides.
    pub fn reset(&mut self) {
        self.previous = Snapshot::Uninitialized;
        self.current = Snapshot::Uninitialized;
    }

    /// Entities in `current` whose key is absent from `previous`, in current
    /// order.
    ///
    /// With `previous` uninitialized this is empty when `suppress_first_load`
    /// is set, otherwise all of `current`.
    pub fn added(&self, suppress_first_load: bool) -> Vec<T> {
        let Some(current) = self.current.loaded() else {
            return Vec::new();
        };
        match self.previous.loaded() {
            Some(previous) => current
                .items()
                .iter()
                .filter(|item| !previous.contains(item.key()))
                .cloned()
                .collect(),
            None if suppress_first_load => Vec::new(),
            None => current.items().to_vec(),
        }
    }

    /// Entities in `previous` whose key is absent from `current`, in previous
    /// order. Empty unless both snapshots are loaded.
    pub fn removed(&self) -> Vec<T> {
        let (Some(previous), Some(current)) = (self.previous.loaded(), self.current.loaded())
        else {
            return Vec::new();
        };
        previous
            .items()
            .iter()
            .filter(|item| !current.contains(item.key()))
            .cloned()
            .collect()
    }

    /// `(previous, current)` pairs for keys present on both sides, in current
    /// order. Empty unless both snapshots are loaded.
    pub fn retained(&self) -> Vec<(&T, &T)> {
        let (Some(previous), Some(current)) = (self.previous.loaded(), self.current.loaded())
        else {
            return Vec::new();
        };
        current
            .items()
            .iter()
            .filter_map(|item| previous.get(item.key()).map(|old| (old, item)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// In-flight flag
// ---------------------------------------------------------------------------

/// Single-entry flag used to coalesce overlapping refreshes.
#[derive(Debug, Default)]
pub(crate) struct InFlight(AtomicBool);

impl InFlight {
    /// Claim the flag. `None` if something else holds it.
    pub(crate) fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(&self.0))
    }

    pub(crate) fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Releases the flag on drop, including when the refresh future is dropped
/// mid-flight.
pub(crate) struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
