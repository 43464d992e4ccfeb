//! External delivery channels for synthesized notifications.
//!
//! Each channel makes a single attempt per record. A failure is reported as
//! an [`AppendNotificationError`](assetflow_core::error::AppendNotificationError)
//! and the record is not retried.

pub mod email;
pub mod webhook;
