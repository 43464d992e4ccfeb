//! Notification delivery to an external webhook.
//!
//! [`WebhookSink`] POSTs each [`NotificationRecord`] as JSON to a configured
//! URL. One attempt per record; a non-2xx answer is a failed delivery.

use std::time::Duration;

use assetflow_core::error::AppendNotificationError;
use assetflow_core::notification::NotificationRecord;
use assetflow_core::store::NotificationSink;
use async_trait::async_trait;

/// HTTP request timeout for a single delivery attempt.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

impl From<WebhookError> for AppendNotificationError {
    fn from(err: WebhookError) -> Self {
        AppendNotificationError::new("webhook", err.to_string())
    }
}

// ---------------------------------------------------------------------------
// WebhookConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
    pub timeout: Duration,
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Load from `NOTIFY_WEBHOOK_URL`; `None` when unset.
    pub fn from_env() -> Option<Self> {
        std::env::var("NOTIFY_WEBHOOK_URL").ok().map(Self::new)
    }
}

// ---------------------------------------------------------------------------
// WebhookSink
// ---------------------------------------------------------------------------

/// Delivers notifications to an external webhook endpoint.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(config: WebhookConfig) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            url: config.url,
        })
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(&self, record: &NotificationRecord) -> Result<(), WebhookError> {
        let response = self.client.post(&self.url).json(record).send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    fn channel(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(&self, record: &NotificationRecord) -> Result<(), AppendNotificationError> {
        self.try_send(record).await.map_err(|e| {
            tracing::warn!(url = %self.url, error = %e, "Webhook delivery failed");
            e.into()
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assetflow_core::notification::Severity;

    use super::*;

    #[test]
    fn new_does_not_fail_with_default_timeout() {
        assert!(WebhookSink::new(WebhookConfig::new("http://localhost:9/hook")).is_ok());
    }

    #[test]
    fn webhook_error_display_http_status() {
        let err = WebhookError::HttpStatus(502);
        assert_eq!(err.to_string(), "Webhook returned HTTP 502");
    }

    #[test]
    fn http_status_converts_to_append_error() {
        let err: AppendNotificationError = WebhookError::HttpStatus(500).into();
        assert_eq!(err.channel, "webhook");
        assert_eq!(err.reason, "Webhook returned HTTP 500");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_delivery_error() {
        // Port 9 (discard) is not expected to accept HTTP on localhost.
        let config = WebhookConfig {
            url: "http://127.0.0.1:9/hook".into(),
            timeout: Duration::from_millis(500),
        };
        let sink = WebhookSink::new(config).unwrap();
        let record =
            NotificationRecord::new("New Asset Available", "m", Severity::Info, chrono::Utc::now());

        let err = sink.deliver(&record).await.unwrap_err();
        assert_eq!(err.channel, "webhook");
    }
}
