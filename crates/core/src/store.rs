//! Seams between the reconciler and the outside world.
//!
//! - [`BackingStore`]: the persistent data store (listing, realtime change
//!   feed, notification append).
//! - [`NotificationSink`]: anything that accepts synthesized notifications.
//! - [`Subscription`]: a realtime change feed for one table.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::asset::{Asset, AssetStatus};
use crate::error::{AppendNotificationError, FetchError};
use crate::notification::NotificationRecord;
use crate::request::{AssetRequest, RequestScope};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Filter for [`BackingStore::list_assets`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetFilter {
    pub status: Option<AssetStatus>,
}

impl AssetFilter {
    pub fn available() -> Self {
        Self {
            status: Some(AssetStatus::Available),
        }
    }
}

/// Filter for [`BackingStore::list_requests`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilter {
    pub employee_id: Option<DbId>,
}

impl From<RequestScope> for RequestFilter {
    fn from(scope: RequestScope) -> Self {
        Self {
            employee_id: scope.employee_id(),
        }
    }
}

// ---------------------------------------------------------------------------
// Realtime change feed
// ---------------------------------------------------------------------------

/// Tables the reconciler watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Assets,
    AssetRequests,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assets => "assets",
            Self::AssetRequests => "asset_requests",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "assets" => Some(Self::Assets),
            "asset_requests" => Some(Self::AssetRequests),
            _ => None,
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A single realtime change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    pub record_id: Option<DbId>,
}

/// Live change feed for one table.
///
/// If the feed is driven by a background task, dropping the subscription
/// aborts that task.
#[derive(Debug)]
pub struct Subscription {
    table: Table,
    events: mpsc::Receiver<ChangeEvent>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(table: Table, events: mpsc::Receiver<ChangeEvent>) -> Self {
        Self {
            table,
            events,
            task: None,
        }
    }

    /// Tie the lifetime of the feeding task to this subscription.
    pub fn with_task(mut self, task: JoinHandle<()>) -> Self {
        self.task = Some(task);
        self
    }

    pub fn table(&self) -> Table {
        self.table
    }

    /// Wait for the next change. `None` once the feed has closed.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// The persistent data store the reconciler reads from and appends to.
#[async_trait]
pub trait BackingStore: Send + Sync {
    async fn list_assets(&self, filter: &AssetFilter) -> Result<Vec<Asset>, FetchError>;

    async fn list_requests(&self, filter: &RequestFilter)
        -> Result<Vec<AssetRequest>, FetchError>;

    async fn subscribe(&self, table: Table) -> Result<Subscription, FetchError>;

    async fn append_notification(
        &self,
        record: &NotificationRecord,
    ) -> Result<(), AppendNotificationError>;
}

/// A destination for synthesized notifications. Write-only.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Short channel name used in logs and errors.
    fn channel(&self) -> &'static str;

    async fn deliver(&self, record: &NotificationRecord) -> Result<(), AppendNotificationError>;
}

/// Persists notifications through [`BackingStore::append_notification`].
pub struct StoreSink {
    store: Arc<dyn BackingStore>,
}

impl StoreSink {
    pub fn new(store: Arc<dyn BackingStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl NotificationSink for StoreSink {
    fn channel(&self) -> &'static str {
        "store"
    }

    async fn deliver(&self, record: &NotificationRecord) -> Result<(), AppendNotificationError> {
        self.store.append_notification(record).await
    }
}
