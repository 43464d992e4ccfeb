//! Background loop that turns triggers into refresh cycles.

use std::sync::Arc;

use assetflow_core::store::Table;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::reconciler::{CycleOutcome, CycleReport, Reconciler};
use crate::trigger::{forward_changes, RefreshTrigger, TriggerHandle};

/// Tables with a realtime subscription when realtime is enabled.
const WATCHED_TABLES: [Table; 2] = [Table::Assets, Table::AssetRequests];

// ---------------------------------------------------------------------------
// RefreshScheduler
// ---------------------------------------------------------------------------

/// Runs cycles on the polling interval and on every queued trigger.
///
/// Cycles run one at a time. Triggers that queue up while a cycle is running
/// collapse into a single follow-up cycle, so a change that lands after the
/// running cycle fetched is still picked up.
pub struct RefreshScheduler {
    reconciler: Arc<Reconciler>,
    handle: TriggerHandle,
    triggers: mpsc::Receiver<RefreshTrigger>,
}

impl RefreshScheduler {
    pub fn new(reconciler: Arc<Reconciler>) -> (Self, TriggerHandle) {
        let (handle, triggers) = TriggerHandle::channel();
        let scheduler = Self {
            reconciler,
            handle: handle.clone(),
            triggers,
        };
        (scheduler, handle)
    }

    /// Run the scheduler loop until `cancel` fires.
    ///
    /// The first interval tick completes immediately, so a cycle runs as soon
    /// as the loop starts.
    pub async fn run(mut self, cancel: CancellationToken) {
        let config = self.reconciler.config().clone();
        let period = config.effective_interval();
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let forwarders = if config.realtime {
            self.subscribe_all().await
        } else {
            Vec::new()
        };

        tracing::info!(
            interval_ms = period.as_millis() as u64,
            realtime = !forwarders.is_empty(),
            "Refresh scheduler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Refresh scheduler cancelled");
                    break;
                }
                _ = interval.tick() => {
                    self.cycle(RefreshTrigger::Interval).await;
                }
                Some(trigger) = self.triggers.recv() => {
                    self.cycle(trigger).await;
                }
            }
        }

        for forwarder in forwarders {
            forwarder.abort();
        }
    }

    async fn subscribe_all(&self) -> Vec<JoinHandle<()>> {
        let mut forwarders = Vec::with_capacity(WATCHED_TABLES.len());
        for table in WATCHED_TABLES {
            match self.reconciler.store().subscribe(table).await {
                Ok(subscription) => {
                    forwarders.push(forward_changes(subscription, self.handle.clone()));
                }
                Err(e) => {
                    tracing::warn!(%table, error = %e, "Realtime subscription failed, polling only");
                }
            }
        }
        forwarders
    }

    /// Run a cycle, then one follow-up cycle for any triggers that queued
    /// while it ran. Queued triggers are collapsed into the last one.
    async fn cycle(&mut self, trigger: RefreshTrigger) {
        let mut trigger = trigger;
        loop {
            let report = self.reconciler.run_cycle(trigger).await;
            log_report(&report);

            let mut pending = None;
            let mut queued = 0usize;
            while let Ok(next) = self.triggers.try_recv() {
                pending = Some(next);
                queued += 1;
            }
            match pending {
                Some(next) => {
                    tracing::debug!(queued, trigger = %next, "Running follow-up cycle");
                    trigger = next;
                }
                None => break,
            }
        }
    }
}

fn log_report(report: &CycleReport) {
    match &report.outcome {
        CycleOutcome::Completed(summary) => tracing::debug!(
            trigger = %report.trigger,
            assets = ?summary.assets,
            requests = ?summary.requests,
            notifications = summary.notifications.len(),
            "Cycle completed"
        ),
        CycleOutcome::Skipped(e) => {
            tracing::debug!(trigger = %report.trigger, reason = %e, "Cycle skipped")
        }
        CycleOutcome::Coalesced => {
            tracing::debug!(trigger = %report.trigger, "Cycle coalesced")
        }
    }
}
