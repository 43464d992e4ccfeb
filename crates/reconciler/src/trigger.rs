//! Refresh triggers.
//!
//! Every reason to run a cycle (the polling timer, the app coming to the
//! foreground, a realtime change, a manual pull-to-refresh) is a
//! [`RefreshTrigger`] on the same bounded channel.

use assetflow_core::store::{ChangeEvent, Subscription};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

/// Pending triggers held while a cycle runs. Anything beyond this is dropped;
/// a cycle is already queued.
pub const TRIGGER_BUFFER: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshTrigger {
    Interval,
    Foreground,
    Realtime(ChangeEvent),
    Manual,
}

impl RefreshTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interval => "interval",
            Self::Foreground => "foreground",
            Self::Realtime(_) => "realtime",
            Self::Manual => "manual",
        }
    }
}

impl std::fmt::Display for RefreshTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cloneable sending side of the trigger channel.
#[derive(Debug, Clone)]
pub struct TriggerHandle {
    tx: mpsc::Sender<RefreshTrigger>,
}

impl TriggerHandle {
    pub(crate) fn channel() -> (Self, mpsc::Receiver<RefreshTrigger>) {
        let (tx, rx) = mpsc::channel(TRIGGER_BUFFER);
        (Self { tx }, rx)
    }

    /// Queue a trigger without waiting. Returns `false` if it was dropped
    /// because the queue is full or the scheduler has stopped.
    pub fn fire(&self, trigger: RefreshTrigger) -> bool {
        match self.tx.try_send(trigger) {
            Ok(()) => true,
            Err(TrySendError::Full(trigger)) => {
                tracing::debug!(%trigger, "Trigger queue full, coalescing");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// The app came to the foreground.
    pub fn foreground(&self) -> bool {
        self.fire(RefreshTrigger::Foreground)
    }

    pub fn manual(&self) -> bool {
        self.fire(RefreshTrigger::Manual)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Turn every event from `subscription` into a realtime trigger until the
/// feed or the scheduler goes away.
pub fn forward_changes(mut subscription: Subscription, handle: TriggerHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        let table = subscription.table();
        while let Some(event) = subscription.next().await {
            if handle.is_closed() {
                break;
            }
            tracing::trace!(%table, record_id = ?event.record_id, "Change event");
            handle.fire(RefreshTrigger::Realtime(event));
        }
        tracing::debug!(%table, "Change feed forwarder stopped");
    })
}

#[cfg(test)]
mod tests {
    use assetflow_core::store::{ChangeKind, Table};

    use super::*;

    #[tokio::test]
    async fn full_queue_drops_triggers() {
        let (handle, mut rx) = TriggerHandle::channel();
        for _ in 0..TRIGGER_BUFFER {
            assert!(handle.manual());
        }
        assert!(!handle.foreground());

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, TRIGGER_BUFFER);
    }

    #[tokio::test]
    async fn closed_scheduler_rejects_triggers() {
        let (handle, rx) = TriggerHandle::channel();
        drop(rx);
        assert!(handle.is_closed());
        assert!(!handle.manual());
    }

    #[tokio::test]
    async fn forwards_change_events() {
        let (handle, mut rx) = TriggerHandle::channel();
        let (tx, events) = mpsc::channel(4);
        let task = forward_changes(Subscription::new(Table::Assets, events), handle);

        let event = ChangeEvent {
            table: Table::Assets,
            kind: ChangeKind::Insert,
            record_id: Some(4),
        };
        tx.send(event.clone()).await.unwrap();
        assert_eq!(rx.recv().await, Some(RefreshTrigger::Realtime(event)));

        drop(tx);
        task.await.unwrap();
    }

    #[test]
    fn trigger_names() {
        assert_eq!(RefreshTrigger::Interval.to_string(), "interval");
        assert_eq!(RefreshTrigger::Foreground.as_str(), "foreground");
    }
}
