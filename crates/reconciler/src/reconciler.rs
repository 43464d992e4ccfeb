//! Composition root and the refresh cycle.
//!
//! A cycle resolves the caller, refreshes both stores concurrently, diffs
//! whichever stores advanced, synthesizes notifications and hands each one
//! to every configured sink. Only one cycle runs at a time; a cycle requested
//! while another is in flight is coalesced into it.

use std::sync::Arc;

use assetflow_core::asset::Asset;
use assetflow_core::error::{AuthError, FetchError};
use assetflow_core::identity::{CallerIdentity, IdentityResolver};
use assetflow_core::notification::NotificationRecord;
use assetflow_core::request::{AssetRequest, RequestScope};
use assetflow_core::store::{BackingStore, NotificationSink, StoreSink};
use assetflow_core::types::Timestamp;
use tokio::sync::watch;

use crate::asset_store::{AssetStore, Refresh};
use crate::config::ReconcilerConfig;
use crate::request_store::{RequestStore, StatusChange};
use crate::snapshot::{Collection, InFlight};
use crate::synthesizer::NotificationSynthesizer;
use crate::trigger::RefreshTrigger;

/// Source of `created_at` for synthesized notifications.
pub type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// What happened to one store during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    /// Snapshots advanced; `count` entities are now current.
    Advanced { count: usize },
    /// A refresh of this store was already running.
    Coalesced,
    /// Fetch failed; snapshots untouched.
    Failed(FetchError),
}

impl StoreOutcome {
    fn from_refresh<T>(result: &Result<Refresh<T>, FetchError>) -> Self {
        match result {
            Ok(Refresh::Advanced(collection)) => Self::Advanced {
                count: collection.len(),
            },
            Ok(Refresh::Coalesced) => Self::Coalesced,
            Err(e) => Self::Failed(e.clone()),
        }
    }

    pub fn is_advanced(&self) -> bool {
        matches!(self, Self::Advanced { .. })
    }
}

#[derive(Debug, Clone)]
pub struct CycleSummary {
    pub caller: CallerIdentity,
    pub assets: StoreOutcome,
    pub requests: StoreOutcome,
    /// Records synthesized this cycle, in delivery order.
    pub notifications: Vec<NotificationRecord>,
    /// Number of (record, sink) deliveries that failed.
    pub delivery_failures: usize,
}

#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Another cycle was in flight.
    Coalesced,
    /// No caller could be resolved; nothing was fetched.
    Skipped(AuthError),
    Completed(CycleSummary),
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub trigger: RefreshTrigger,
    pub outcome: CycleOutcome,
}

impl CycleReport {
    pub fn summary(&self) -> Option<&CycleSummary> {
        match &self.outcome {
            CycleOutcome::Completed(summary) => Some(summary),
            _ => None,
        }
    }
}

/// Read-only state published after every completed cycle.
#[derive(Debug, Clone, Default)]
pub struct ReconcilerView {
    pub available_assets: Option<Arc<Collection<Asset>>>,
    pub requests: Option<Arc<Collection<AssetRequest>>>,
    pub last_cycle_at: Option<Timestamp>,
    /// Most recent fetch error of the last cycle, if any.
    pub last_error: Option<String>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct ReconcilerBuilder {
    store: Arc<dyn BackingStore>,
    identity: Arc<dyn IdentityResolver>,
    config: ReconcilerConfig,
    sinks: Vec<Arc<dyn NotificationSink>>,
    persist: bool,
    clock: Option<Clock>,
}

impl ReconcilerBuilder {
    pub fn config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a sink. Records go to the backing store first, then to sinks in
    /// the order they were added.
    pub fn sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Do not append notifications to the backing store.
    pub fn without_store_sink(mut self) -> Self {
        self.persist = false;
        self
    }

    pub fn clock(mut self, clock: impl Fn() -> Timestamp + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn build(self) -> Reconciler {
        let mut sinks: Vec<Arc<dyn NotificationSink>> = Vec::with_capacity(self.sinks.len() + 1);
        if self.persist {
            sinks.push(Arc::new(StoreSink::new(Arc::clone(&self.store))));
        }
        sinks.extend(self.sinks);

        let clock: Clock = match self.clock {
            Some(clock) => clock,
            None => Arc::new(chrono::Utc::now),
        };
        let suppress = self.config.suppress_first_load;
        let (view, _) = watch::channel(Arc::new(ReconcilerView::default()));

        Reconciler {
            assets: AssetStore::new(Arc::clone(&self.store), suppress),
            requests: RequestStore::new(Arc::clone(&self.store), suppress),
            store: self.store,
            identity: self.identity,
            synthesizer: NotificationSynthesizer::new(),
            sinks,
            config: self.config,
            clock,
            in_flight: InFlight::default(),
            view,
        }
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

pub struct Reconciler {
    store: Arc<dyn BackingStore>,
    identity: Arc<dyn IdentityResolver>,
    assets: AssetStore,
    requests: RequestStore,
    synthesizer: NotificationSynthesizer,
    sinks: Vec<Arc<dyn NotificationSink>>,
    config: ReconcilerConfig,
    clock: Clock,
    in_flight: InFlight,
    view: watch::Sender<Arc<ReconcilerView>>,
}

impl Reconciler {
    pub fn builder(
        store: Arc<dyn BackingStore>,
        identity: Arc<dyn IdentityResolver>,
    ) -> ReconcilerBuilder {
        ReconcilerBuilder {
            store,
            identity,
            config: ReconcilerConfig::default(),
            sinks: Vec::new(),
            persist: true,
            clock: None,
        }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn requests(&self) -> &RequestStore {
        &self.requests
    }

    pub(crate) fn store(&self) -> &Arc<dyn BackingStore> {
        &self.store
    }

    /// Latest published view. The receiver is notified after every
    /// completed cycle.
    pub fn subscribe_view(&self) -> watch::Receiver<Arc<ReconcilerView>> {
        self.view.subscribe()
    }

    pub fn view(&self) -> Arc<ReconcilerView> {
        Arc::clone(&self.view.borrow())
    }

    /// Run one cycle now, outside the scheduler.
    pub async fn refresh_now(&self) -> CycleReport {
        self.run_cycle(RefreshTrigger::Manual).await
    }

    pub async fn run_cycle(&self, trigger: RefreshTrigger) -> CycleReport {
        let outcome = self.cycle(&trigger).await;
        CycleReport { trigger, outcome }
    }

    async fn cycle(&self, trigger: &RefreshTrigger) -> CycleOutcome {
        let Some(_guard) = self.in_flight.try_begin() else {
            tracing::debug!(%trigger, "Cycle already in flight, coalescing");
            return CycleOutcome::Coalesced;
        };

        let caller = match self.identity.resolve().await {
            Ok(caller) => caller,
            Err(e) => {
                tracing::debug!(%trigger, error = %e, "No caller, skipping cycle");
                return CycleOutcome::Skipped(e);
            }
        };
        let scope = caller.request_scope();

        let (asset_result, request_result) =
            tokio::join!(self.assets.refresh(), self.requests.refresh(scope));

        let assets = StoreOutcome::from_refresh(&asset_result);
        let requests = StoreOutcome::from_refresh(&request_result);
        if let Err(e) = &asset_result {
            tracing::warn!(%trigger, error = %e, "Asset refresh failed");
        }
        if let Err(e) = &request_result {
            tracing::warn!(%trigger, error = %e, "Request refresh failed");
        }

        let notifications = self.synthesize(&caller, scope, &assets, &requests);
        let delivery_failures = self.deliver(&notifications).await;

        if !notifications.is_empty() {
            tracing::info!(
                %trigger,
                employee_id = caller.employee_id,
                count = notifications.len(),
                delivery_failures,
                "Notifications synthesized"
            );
        }

        self.publish_view(&asset_result, &request_result);

        CycleOutcome::Completed(CycleSummary {
            caller,
            assets,
            requests,
            notifications,
            delivery_failures,
        })
    }

    fn synthesize(
        &self,
        caller: &CallerIdentity,
        scope: RequestScope,
        assets: &StoreOutcome,
        requests: &StoreOutcome,
    ) -> Vec<NotificationRecord> {
        let new_assets = if assets.is_advanced() {
            self.assets.diff_newly_available()
        } else {
            Vec::new()
        };

        let (changes, submitted) = if requests.is_advanced() {
            let disappeared = self.requests.diff_disappeared();
            if !disappeared.is_empty() {
                tracing::debug!(count = disappeared.len(), "Requests disappeared");
            }

            // "Your request" messages go only to the employee who filed it.
            let changes: Vec<StatusChange> = self
                .requests
                .diff_status_changes()
                .into_iter()
                .filter(|c| c.employee_id == caller.employee_id)
                .map(|mut c| {
                    if c.asset_name.is_none() {
                        c.asset_name = self.assets.get_by_id(c.asset_id).map(|a| a.name);
                    }
                    c
                })
                .collect();

            let submitted: Vec<AssetRequest> = if scope == RequestScope::All {
                self.requests
                    .diff_submitted()
                    .into_iter()
                    .map(|mut r| {
                        if r.asset_name.is_none() {
                            r.asset_name = self.assets.get_by_id(r.asset_id).map(|a| a.name);
                        }
                        r
                    })
                    .collect()
            } else {
                Vec::new()
            };
            (changes, submitted)
        } else {
            (Vec::new(), Vec::new())
        };

        let now = (self.clock)();
        let mut records = self.synthesizer.synthesize_at(now, &new_assets, &changes);
        records.extend(self.synthesizer.synthesize_submissions_at(now, &submitted));
        records
            .into_iter()
            .map(|r| r.with_recipient(caller.employee_id))
            .collect()
    }

    /// Hand every record to every sink. Failures are logged and counted;
    /// the record is not retried.
    async fn deliver(&self, records: &[NotificationRecord]) -> usize {
        let mut failures = 0;
        for record in records {
            for sink in &self.sinks {
                if let Err(e) = sink.deliver(record).await {
                    failures += 1;
                    tracing::warn!(
                        channel = sink.channel(),
                        title = %record.title,
                        error = %e,
                        "Notification dropped"
                    );
                }
            }
        }
        failures
    }

    fn publish_view(
        &self,
        assets: &Result<Refresh<Asset>, FetchError>,
        requests: &Result<Refresh<AssetRequest>, FetchError>,
    ) {
        let last_error = match (assets, requests) {
            (_, Err(e)) | (Err(e), _) => Some(e.to_string()),
            _ => None,
        };
        let view = ReconcilerView {
            available_assets: self.assets.current().loaded().cloned(),
            requests: self.requests.current().loaded().cloned(),
            last_cycle_at: Some((self.clock)()),
            last_error,
        };
        self.view.send_replace(Arc::new(view));
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use assetflow_core::asset::AssetStatus;
    use assetflow_core::identity::SessionIdentity;
    use assetflow_core::request::RequestStatus;
    use chrono::TimeZone;

    use super::*;
    use crate::memory::MemoryStore;

    fn fixed_now() -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn setup(identity: Option<CallerIdentity>) -> (Arc<MemoryStore>, Reconciler) {
        let store = Arc::new(MemoryStore::new());
        let reconciler = Reconciler::builder(store.clone(), Arc::new(SessionIdentity::new(identity)))
            .clock(fixed_now)
            .build();
        (store, reconciler)
    }

    #[tokio::test]
    async fn no_session_skips_cycle() {
        let (store, reconciler) = setup(None);
        let report = reconciler.refresh_now().await;

        assert_matches!(report.outcome, CycleOutcome::Skipped(AuthError::NoSession));
        assert_eq!(store.asset_fetch_count(), 0);
        assert_eq!(store.request_fetch_count(), 0);
    }

    #[tokio::test]
    async fn notifications_are_addressed_and_persisted() {
        let (store, reconciler) = setup(Some(CallerIdentity::employee(7)));
        store.insert_request(
            AssetRequest::new(1, 7, 42, RequestStatus::Pending, fixed_now())
                .with_asset_name("MacBook Pro"),
        );
        reconciler.refresh_now().await;

        store.set_request_status(1, RequestStatus::Approved).unwrap();
        let report = reconciler.refresh_now().await;

        let summary = report.summary().unwrap();
        assert_eq!(summary.notifications.len(), 1);
        assert_eq!(summary.notifications[0].recipient_id, Some(7));
        assert_eq!(summary.notifications[0].created_at, fixed_now());
        assert_eq!(store.notifications(), summary.notifications);
    }

    #[tokio::test]
    async fn asset_name_falls_back_to_asset_snapshot() {
        let (store, reconciler) = setup(Some(CallerIdentity::employee(7)));
        store.insert_asset(Asset::new(42, "Projector", "PJ-042", AssetStatus::Available, fixed_now()));
        store.insert_request(AssetRequest::new(1, 7, 42, RequestStatus::Pending, fixed_now()));
        reconciler.refresh_now().await;

        store.set_request_status(1, RequestStatus::InProgress).unwrap();
        let report = reconciler.refresh_now().await;

        assert_eq!(
            report.summary().unwrap().notifications[0].message,
            "Your request for Projector is now being processed."
        );
    }

    #[tokio::test]
    async fn view_is_published_after_cycle() {
        let (store, reconciler) = setup(Some(CallerIdentity::employee(7)));
        store.insert_asset(Asset::new(1, "Laptop", "LP-001", AssetStatus::Available, fixed_now()));
        let mut view = reconciler.subscribe_view();
        assert!(view.borrow().available_assets.is_none());

        reconciler.refresh_now().await;

        assert!(view.has_changed().unwrap());
        let current = view.borrow_and_update().clone();
        assert_eq!(current.available_assets.as_ref().map(|c| c.len()), Some(1));
        assert_eq!(current.requests.as_ref().map(|c| c.len()), Some(0));
        assert_eq!(current.last_cycle_at, Some(fixed_now()));
        assert!(current.last_error.is_none());
    }

    #[tokio::test]
    async fn fetch_error_is_published() {
        let (store, reconciler) = setup(Some(CallerIdentity::employee(7)));
        store.fail_next_asset_fetch(FetchError::Network("offline".into()));

        let report = reconciler.refresh_now().await;

        let summary = report.summary().unwrap();
        assert_matches!(summary.assets, StoreOutcome::Failed(FetchError::Network(_)));
        assert!(summary.requests.is_advanced());
        assert_eq!(reconciler.view().last_error.as_deref(), Some("Network error: offline"));
    }

    #[test]
    fn store_outcome_from_refresh() {
        let collection = Arc::new(Collection::from_items(vec![
            Asset::new(1, "Laptop", "LP-001", AssetStatus::Available, fixed_now()),
            Asset::new(2, "Phone", "PH-002", AssetStatus::Available, fixed_now()),
        ]));

        assert_eq!(
            StoreOutcome::from_refresh(&Ok(Refresh::Advanced(collection))),
            StoreOutcome::Advanced { count: 2 }
        );
        assert_eq!(
            StoreOutcome::from_refresh::<Asset>(&Ok(Refresh::Coalesced)),
            StoreOutcome::Coalesced
        );
        assert_eq!(
            StoreOutcome::from_refresh::<AssetRequest>(&Err(FetchError::Backend("denied".into()))),
            StoreOutcome::Failed(FetchError::Backend("denied".into()))
        );
    }
}
