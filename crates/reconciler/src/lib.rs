//! Client-side state reconciler for asset requests.
//!
//! Keeps the last two snapshots of the available assets and of the caller's
//! requests, diffs them on every refresh, and turns the differences into
//! user-facing notifications.
//!
//! ```text
//! trigger -> RefreshScheduler -> Reconciler::run_cycle
//!              |                   |- AssetStore::refresh   -+ tokio::join!
//!              |                   |- RequestStore::refresh -+
//!              |                   |- NotificationSynthesizer
//!              |                   '- NotificationSink(s)
//!              '- realtime Subscription forwarders
//! ```

pub mod asset_store;
pub mod config;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod reconciler;
pub mod request_store;
pub mod scheduler;
pub mod snapshot;
pub mod synthesizer;
pub mod trigger;

pub use asset_store::{AssetStore, Refresh};
pub use config::{ConfigError, ReconcilerConfig};
#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryStore;
pub use reconciler::{
    Clock, CycleOutcome, CycleReport, CycleSummary, Reconciler, ReconcilerBuilder,
    ReconcilerView, StoreOutcome,
};
pub use request_store::{RequestStore, StatusChange};
pub use scheduler::RefreshScheduler;
pub use snapshot::{Collection, Keyed, Snapshot};
pub use synthesizer::NotificationSynthesizer;
pub use trigger::{RefreshTrigger, TriggerHandle};
