//! Scheduler loop: interval, foreground and realtime triggers, cancellation.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assetflow_core::error::{AppendNotificationError, FetchError};
use assetflow_core::identity::CallerIdentity;
use assetflow_core::notification::NotificationRecord;
use assetflow_core::request::RequestStatus;
use assetflow_core::store::NotificationSink;
use assetflow_reconciler::{MemoryStore, ReconcilerConfig, RefreshScheduler};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use common::*;

const LONG_INTERVAL: Duration = Duration::from_secs(3600);

/// Sink that approves a second request while the first approval is being
/// delivered, then lingers so the change event queues a trigger mid-cycle.
struct ApprovingSink {
    store: Arc<MemoryStore>,
    done: AtomicBool,
}

#[async_trait]
impl NotificationSink for ApprovingSink {
    fn channel(&self) -> &'static str {
        "approving"
    }

    async fn deliver(&self, record: &NotificationRecord) -> Result<(), AppendNotificationError> {
        if record.message.contains("MacBook Pro") && !self.done.swap(true, Ordering::SeqCst) {
            self.store.set_request_status(2, RequestStatus::Approved).unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        Ok(())
    }
}

#[tokio::test]
async fn runs_on_start_and_on_foreground() {
    let (store, _, builder) = builder_for(CallerIdentity::employee(EMPLOYEE_ID));
    let reconciler = Arc::new(
        builder
            .config(
                ReconcilerConfig::default()
                    .with_refresh_interval(LONG_INTERVAL)
                    .with_realtime(false),
            )
            .build(),
    );
    let (scheduler, handle) = RefreshScheduler::new(reconciler.clone());
    let cancel = CancellationToken::new();
    let task = tokio::spawn(scheduler.run(cancel.clone()));

    assert!(eventually(|| store.request_fetch_count() == 1).await);

    assert!(handle.foreground());
    assert!(eventually(|| store.request_fetch_count() == 2).await);

    cancel.cancel();
    task.await.unwrap();
    assert!(handle.is_closed());
    assert!(!handle.manual());
}

#[tokio::test]
async fn realtime_change_triggers_a_cycle() {
    let (store, _, builder) = builder_for(CallerIdentity::employee(EMPLOYEE_ID));
    let reconciler = Arc::new(
        builder
            .config(
                ReconcilerConfig::default()
                    .with_refresh_interval(LONG_INTERVAL)
                    .with_realtime(true),
            )
            .build(),
    );
    store.insert_request(request(1, EMPLOYEE_ID, 42, "MacBook Pro"));

    let (scheduler, _handle) = RefreshScheduler::new(reconciler.clone());
    let cancel = CancellationToken::new();
    let task = tokio::spawn(scheduler.run(cancel.clone()));
    assert!(eventually(|| reconciler.requests().current().is_initialized()).await);

    store.set_request_status(1, RequestStatus::Approved).unwrap();
    assert!(eventually(|| store.notifications().len() == 1).await);
    assert_eq!(store.notifications()[0].title, "Request Approved");

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn polling_continues_without_realtime_feed() {
    let (store, _, builder) = builder_for(CallerIdentity::employee(EMPLOYEE_ID));
    let reconciler = Arc::new(
        builder
            .config(
                ReconcilerConfig::default()
                    .with_refresh_interval(Duration::from_millis(100))
                    .with_realtime(true),
            )
            .build(),
    );
    store.fail_next_subscribe(FetchError::Network("no realtime".into()));

    let (scheduler, _handle) = RefreshScheduler::new(reconciler);
    let cancel = CancellationToken::new();
    let task = tokio::spawn(scheduler.run(cancel.clone()));

    assert!(eventually(|| store.asset_fetch_count() >= 3).await);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn fetch_failures_do_not_stop_the_loop() {
    let (store, _, builder) = builder_for(CallerIdentity::employee(EMPLOYEE_ID));
    let reconciler = Arc::new(
        builder
            .config(
                ReconcilerConfig::default()
                    .with_refresh_interval(LONG_INTERVAL)
                    .with_realtime(false),
            )
            .build(),
    );
    store.fail_next_asset_fetch(FetchError::Backend("boom".into()));
    store.fail_next_request_fetch(FetchError::Backend("boom".into()));

    let (scheduler, handle) = RefreshScheduler::new(reconciler.clone());
    let cancel = CancellationToken::new();
    let task = tokio::spawn(scheduler.run(cancel.clone()));
    assert!(eventually(|| store.asset_fetch_count() == 1).await);
    assert!(eventually(|| reconciler.view().last_error.is_some()).await);

    handle.manual();
    assert!(eventually(|| reconciler.assets().current().is_initialized()).await);
    assert!(eventually(|| reconciler.view().last_error.is_none()).await);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn change_during_a_cycle_gets_a_follow_up_cycle() {
    let (store, _, builder) = builder_for(CallerIdentity::employee(EMPLOYEE_ID));
    let sink = Arc::new(ApprovingSink {
        store: Arc::clone(&store),
        done: AtomicBool::new(false),
    });
    let reconciler = Arc::new(
        builder
            .config(
                ReconcilerConfig::default()
                    .with_refresh_interval(LONG_INTERVAL)
                    .with_realtime(true),
            )
            .sink(sink)
            .build(),
    );
    store.insert_request(request(1, EMPLOYEE_ID, 42, "MacBook Pro"));
    store.insert_request(request(2, EMPLOYEE_ID, 43, "ThinkPad"));

    let (scheduler, _handle) = RefreshScheduler::new(reconciler.clone());
    let cancel = CancellationToken::new();
    let task = tokio::spawn(scheduler.run(cancel.clone()));
    assert!(eventually(|| reconciler.requests().current().is_initialized()).await);

    store.set_request_status(1, RequestStatus::Approved).unwrap();

    // No interval tick or manual trigger: only the queued change can report it.
    assert!(eventually(|| store.notifications().len() == 2).await);
    let notifications = store.notifications();
    assert!(notifications[0].message.contains("MacBook Pro"));
    assert!(notifications[1].message.contains("ThinkPad"));

    cancel.cancel();
    task.await.unwrap();
}
