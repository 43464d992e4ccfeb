//! Notification delivery via SMTP.
//!
//! [`EmailSink`] wraps the `lettre` async SMTP transport to send plain-text
//! notification emails to a single configured mailbox (for example an asset
//! desk inbox). Configuration is loaded from environment variables; if
//! `SMTP_HOST` or `NOTIFY_EMAIL_TO` is not set, [`EmailConfig::from_env`]
//! returns `None` and no sink should be constructed.

use assetflow_core::error::AppendNotificationError;
use assetflow_core::notification::NotificationRecord;
use assetflow_core::store::NotificationSink;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

impl From<EmailError> for AppendNotificationError {
    fn from(err: EmailError) -> Self {
        AppendNotificationError::new("email", err.to_string())
    }
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@assetflow.local";

/// Configuration for the SMTP email sink.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Mailbox every notification is sent to.
    pub to_address: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` or `NOTIFY_EMAIL_TO` is not set,
    /// signalling that email delivery is not configured.
    ///
    /// | Variable          | Required | Default                    |
    /// |-------------------|----------|----------------------------|
    /// | `SMTP_HOST`       | yes      | -                          |
    /// | `NOTIFY_EMAIL_TO` | yes      | -                          |
    /// | `SMTP_PORT`       | no       | `587`                      |
    /// | `SMTP_FROM`       | no       | `noreply@assetflow.local`  |
    /// | `SMTP_USER`       | no       | -                          |
    /// | `SMTP_PASSWORD`   | no       | -                          |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        let to_address = std::env::var("NOTIFY_EMAIL_TO").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            to_address,
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// EmailSink
// ---------------------------------------------------------------------------

/// Sends each notification as a plain-text email.
pub struct EmailSink {
    from: Mailbox,
    to: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailSink {
    /// Build the SMTP transport and validate both addresses up front.
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let from: Mailbox = config.from_address.parse()?;
        let to: Mailbox = config.to_address.parse()?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (config.smtp_user, config.smtp_password) {
            transport_builder = transport_builder.credentials(Credentials::new(user, pass));
        }

        Ok(Self {
            from,
            to,
            mailer: transport_builder.build(),
        })
    }

    async fn send(&self, record: &NotificationRecord) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject(record))
            .header(ContentType::TEXT_PLAIN)
            .body(body(record))
            .map_err(|e| EmailError::Build(e.to_string()))?;

        self.mailer.send(email).await?;

        tracing::info!(to = %self.to, title = %record.title, "Notification email sent");
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for EmailSink {
    fn channel(&self) -> &'static str {
        "email"
    }

    async fn deliver(&self, record: &NotificationRecord) -> Result<(), AppendNotificationError> {
        self.send(record).await.map_err(Into::into)
    }
}

fn subject(record: &NotificationRecord) -> String {
    format!("[assetflow] {}", record.title)
}

fn body(record: &NotificationRecord) -> String {
    let mut body = format!(
        "{}\n\nSeverity: {}\nTime: {}",
        record.message, record.severity, record.created_at
    );
    if let Some(subtext) = &record.subtext {
        body.push_str(&format!("\nDetails: {subtext}"));
    }
    body
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
