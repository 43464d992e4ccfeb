//! In-process notification bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`NotificationBus`] is how UI code hears about new notifications without
//! polling the store. It is designed to be shared via `Arc<NotificationBus>`.

use assetflow_core::error::AppendNotificationError;
use assetflow_core::notification::NotificationRecord;
use assetflow_core::store::NotificationSink;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out of synthesized notifications.
///
/// # Usage
///
/// ```rust
/// use assetflow_events::NotificationBus;
///
/// let bus = NotificationBus::default();
/// let mut rx = bus.subscribe();
/// ```
pub struct NotificationBus {
    sender: broadcast::Sender<NotificationRecord>,
}

impl NotificationBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed records are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a record to all current subscribers.
    ///
    /// With no subscribers the record is silently dropped; the store sink is
    /// what keeps it.
    pub fn publish(&self, record: NotificationRecord) {
        let _ = self.sender.send(record);
    }

    /// Subscribe to every record published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationRecord> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl NotificationSink for NotificationBus {
    fn channel(&self) -> &'static str {
        "in_app"
    }

    async fn deliver(&self, record: &NotificationRecord) -> Result<(), AppendNotificationError> {
        self.publish(record.clone());
        Ok(())
    }
}
