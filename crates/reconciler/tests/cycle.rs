//! Identity, scope and delivery behaviour of the reconciler.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use assetflow_core::error::{AppendNotificationError, AuthError};
use assetflow_core::identity::CallerIdentity;
use assetflow_core::notification::{NotificationRecord, Severity};
use assetflow_core::request::{RequestScope, RequestStatus};
use assetflow_core::store::{NotificationSink, RequestFilter};
use assetflow_events::NotificationBus;
use assetflow_reconciler::{CycleOutcome, ReconcilerConfig};
use async_trait::async_trait;

use common::*;

/// Sink that always refuses.
struct RefusingSink;

#[async_trait]
impl NotificationSink for RefusingSink {
    fn channel(&self) -> &'static str {
        "refusing"
    }

    async fn deliver(&self, _record: &NotificationRecord) -> Result<(), AppendNotificationError> {
        Err(AppendNotificationError::new("refusing", "nope"))
    }
}

#[tokio::test]
async fn cycle_waits_for_a_session() {
    let (store, identity, builder) = builder_for(CallerIdentity::employee(EMPLOYEE_ID));
    let reconciler = builder.build();
    identity.sign_out();

    let report = reconciler.refresh_now().await;
    assert_matches!(report.outcome, CycleOutcome::Skipped(AuthError::NoSession));
    assert_eq!(store.request_fetch_count(), 0);

    identity.sign_in(CallerIdentity::employee(EMPLOYEE_ID));
    let report = reconciler.refresh_now().await;
    assert_matches!(report.outcome, CycleOutcome::Completed(_));
    assert_eq!(
        store.last_request_filter(),
        Some(RequestFilter { employee_id: Some(EMPLOYEE_ID) })
    );
}

#[tokio::test]
async fn employee_sees_only_own_requests() {
    let (store, reconciler) = employee_reconciler();
    store.insert_request(request(1, EMPLOYEE_ID, 42, "MacBook Pro"));
    store.insert_request(request(2, OTHER_EMPLOYEE_ID, 43, "ThinkPad"));
    reconciler.refresh_now().await;

    store.set_request_status(2, RequestStatus::Approved).unwrap();
    let report = reconciler.refresh_now().await;

    assert!(report.summary().unwrap().notifications.is_empty());
    assert_eq!(reconciler.requests().scope(), Some(RequestScope::Employee(EMPLOYEE_ID)));
}

#[tokio::test]
async fn switching_employee_starts_from_first_load() {
    let (store, identity, builder) = builder_for(CallerIdentity::employee(EMPLOYEE_ID));
    let reconciler = builder.build();
    store.insert_request(request(1, EMPLOYEE_ID, 42, "MacBook Pro"));
    store.insert_request(request(2, OTHER_EMPLOYEE_ID, 43, "ThinkPad"));
    reconciler.refresh_now().await;

    identity.sign_in(CallerIdentity::employee(OTHER_EMPLOYEE_ID));
    let report = reconciler.refresh_now().await;

    assert!(report.summary().unwrap().notifications.is_empty());
    assert_eq!(reconciler.requests().scope(), Some(RequestScope::Employee(OTHER_EMPLOYEE_ID)));

    store.set_request_status(2, RequestStatus::Approved).unwrap();
    let report = reconciler.refresh_now().await;
    let records = &report.summary().unwrap().notifications;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].recipient_id, Some(OTHER_EMPLOYEE_ID));
}

#[tokio::test]
async fn admin_is_told_about_new_pending_requests() {
    let (store, reconciler) = admin_reconciler();
    store.insert_request(request(1, EMPLOYEE_ID, 42, "MacBook Pro"));
    reconciler.refresh_now().await;
    assert_eq!(store.last_request_filter(), Some(RequestFilter { employee_id: None }));

    store.insert_request(request(2, OTHER_EMPLOYEE_ID, 43, "ThinkPad").with_employee_name("Sam Park"));
    store.set_request_status(1, RequestStatus::Approved).unwrap();
    let report = reconciler.refresh_now().await;

    // The approval belongs to another employee; only the submission reaches the admin.
    let records = &report.summary().unwrap().notifications;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "New Asset Request");
    assert_eq!(records[0].message, "Sam Park requested ThinkPad.");
    assert_eq!(records[0].severity, Severity::Info);
    assert_eq!(records[0].recipient_id, Some(ADMIN_ID));
}

#[tokio::test]
async fn employee_is_not_told_about_own_submissions() {
    let (store, reconciler) = employee_reconciler();
    reconciler.refresh_now().await;

    store.insert_request(request(1, EMPLOYEE_ID, 42, "MacBook Pro"));
    let report = reconciler.refresh_now().await;

    assert!(report.summary().unwrap().notifications.is_empty());
}

#[tokio::test]
async fn failed_sink_does_not_stop_other_sinks() {
    let bus = Arc::new(NotificationBus::default());
    let mut inbox = bus.subscribe();
    let (store, _, builder) = builder_for(CallerIdentity::employee(EMPLOYEE_ID));
    let reconciler = builder
        .sink(Arc::new(RefusingSink))
        .sink(bus.clone())
        .build();
    store.insert_request(request(1, EMPLOYEE_ID, 42, "MacBook Pro"));
    reconciler.refresh_now().await;

    store.fail_appends("read-only replica");
    store.set_request_status(1, RequestStatus::Approved).unwrap();
    let report = reconciler.refresh_now().await;

    let summary = report.summary().unwrap();
    assert_eq!(summary.notifications.len(), 1);
    assert_eq!(summary.delivery_failures, 2);
    assert!(store.notifications().is_empty());

    let delivered = inbox.try_recv().unwrap();
    assert_eq!(delivered.title, "Request Approved");

    // Dropped, not retried.
    store.accept_appends();
    reconciler.refresh_now().await;
    assert!(store.notifications().is_empty());
}

#[tokio::test]
async fn store_sink_can_be_disabled() {
    let bus = Arc::new(NotificationBus::default());
    let mut inbox = bus.subscribe();
    let (store, _, builder) = builder_for(CallerIdentity::employee(EMPLOYEE_ID));
    let reconciler = builder.without_store_sink().sink(bus).build();
    store.insert_asset(asset(1, "Laptop"));
    reconciler.refresh_now().await;

    store.insert_asset(asset(2, "Phone"));
    reconciler.refresh_now().await;

    assert!(store.notifications().is_empty());
    assert_eq!(inbox.try_recv().unwrap().title, "New Asset Available");
}

#[tokio::test]
async fn first_load_can_be_reported() {
    let (store, _, builder) = builder_for(CallerIdentity::employee(EMPLOYEE_ID));
    let reconciler = builder
        .config(
            ReconcilerConfig::default()
                .with_realtime(false)
                .with_suppress_first_load(false),
        )
        .build();
    store.insert_asset(asset(1, "Laptop"));
    store.insert_asset(asset(2, "Phone"));

    let report = reconciler.refresh_now().await;
    assert_eq!(report.summary().unwrap().notifications.len(), 2);
}
