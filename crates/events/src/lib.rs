//! Notification delivery channels.
//!
//! Every channel implements
//! [`NotificationSink`](assetflow_core::store::NotificationSink) so the
//! reconciler can fan a synthesized record out to any combination of them:
//!
//! - [`NotificationBus`]: in-process broadcast to UI consumers (in-app
//!   push), backed by `tokio::sync::broadcast`.
//! - [`delivery::email`]: SMTP delivery to a fixed mailbox.
//! - [`delivery::webhook`]: JSON POST to an external endpoint.

pub mod bus;
pub mod delivery;

pub use bus::NotificationBus;
pub use delivery::email::{EmailConfig, EmailSink};
pub use delivery::webhook::{WebhookConfig, WebhookSink};
