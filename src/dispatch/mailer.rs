//! Outbound email via SMTP (lettre).
//!
//! Used both as the email-relay integration and as the best-effort
//! notification sent next to an HTTP integration.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, Message, SmtpTransport, Transport as _};
use secrecy::{ExposeSecret, SecretString};

use crate::error::{ConfigError, TransportError};

/// SMTP settings. Credentials and recipient may be absent until the relay
/// is actually used.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub to: Option<String>,
    pub from_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username: None,
            password: None,
            to: None,
            from_name: "Formulario Swipe".to_string(),
        }
    }
}

impl EmailConfig {
    /// Username, password and recipient, or the first one missing.
    fn credentials(&self) -> Result<(&str, &SecretString, &str), ConfigError> {
        let username = self.username.as_deref().ok_or_else(|| missing("EMAIL_USER"))?;
        let password = self.password.as_ref().ok_or_else(|| missing("EMAIL_PASS"))?;
        let to = self.to.as_deref().ok_or_else(|| missing("EMAIL_TO"))?;
        Ok((username, password, to))
    }

    /// Whether everything needed to send is present.
    pub fn is_complete(&self) -> bool {
        self.credentials().is_ok()
    }
}

fn missing(key: &str) -> ConfigError {
    ConfigError::MissingRequired {
        key: key.to_string(),
        hint: "Set it to enable the email relay.".to_string(),
    }
}

/// A plain-text message to the agency inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub subject: String,
    pub body: String,
}

/// Capability to deliver a [`MailMessage`].
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), TransportError>;
}

/// lettre SMTP mailer. STARTTLS on 587, implicit TLS on 465.
pub struct SmtpMailer {
    config: EmailConfig,
    timeout: Duration,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }

    fn build_message(&self, message: MailMessage) -> Result<(Message, Credentials), TransportError> {
        let (username, password, to) = self.config.credentials()?;

        let from_address: Address = username.parse().map_err(|e| send_failed(format!(
            "Invalid from address: {e}"
        )))?;
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| send_failed(format!("Invalid to address: {e}")))?;

        let email = Message::builder()
            .from(Mailbox::new(Some(self.config.from_name.clone()), from_address))
            .to(to_mailbox)
            .subject(message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body)
            .map_err(|e| send_failed(format!("Failed to build email: {e}")))?;

        let creds = Credentials::new(username.to_string(), password.expose_secret().to_string());
        Ok((email, creds))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: MailMessage) -> Result<(), TransportError> {
        let (email, creds) = self.build_message(message)?;

        let relay = if self.config.smtp_port == 465 {
            SmtpTransport::relay(&self.config.smtp_host)
        } else {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
        };
        let transport = relay
            .map_err(|e| send_failed(format!("SMTP relay error: {e}")))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .timeout(Some(self.timeout))
            .build();

        // lettre's SmtpTransport is blocking.
        tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| send_failed(format!("SMTP task panicked: {e}")))?
            .map_err(|e| send_failed(format!("SMTP send failed: {e}")))?;

        tracing::info!(smtp_host = %self.config.smtp_host, "Onboarding email sent");
        Ok(())
    }
}

fn send_failed(reason: String) -> TransportError {
    TransportError::SendFailed {
        target: "email".into(),
        reason,
    }
}
