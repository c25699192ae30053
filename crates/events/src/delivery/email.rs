//! Email delivery via SMTP.
//!
//! [`EmailCourier`] wraps the `lettre` async SMTP transport. Configuration is
//! loaded from environment variables; if `SMTP_HOST` is not set,
//! [`EmailConfig::from_env`] returns `None` and the email channel stays
//! unconfigured.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{Channel, Courier, DeliveryError, OutboundMessage};

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),
}

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@opendlp.local";

/// Configuration for the SMTP courier.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set.
    ///
    /// | Variable        | Required | Default                  |
    /// |-----------------|----------|--------------------------|
    /// | `SMTP_HOST`     | yes      | --                        |
    /// | `SMTP_PORT`     | no       | `587`                    |
    /// | `SMTP_FROM`     | no       | `noreply@opendlp.local`  |
    /// | `SMTP_USER`     | no       | --                        |
    /// | `SMTP_PASSWORD` | no       | --                        |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

/// Sends plain-text email through an SMTP relay.
///
/// The transport is built once and keeps a pool of SMTP connections, so a
/// bulk dispatch reuses connections instead of opening one per message.
pub struct EmailCourier {
    config: EmailConfig,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailCourier {
    /// Build the courier and its SMTP transport.
    ///
    /// Fails if the relay's TLS parameters cannot be derived from `smtp_host`.
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            mailer: transport_builder.build(),
            config,
        })
    }

    /// Assemble the MIME message for `message`.
    pub fn build_message(&self, message: &OutboundMessage) -> Result<Message, EmailError> {
        Message::builder()
            .from(self.config.from_address.parse()?)
            .to(message.to.parse()?)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| EmailError::Build(e.to_string()))
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<(), EmailError> {
        let email = self.build_message(message)?;
        self.mailer.send(email).await?;

        tracing::info!(
            to = %message.to,
            reference = message.reference.as_deref().unwrap_or(""),
            "Email sent"
        );
        Ok(())
    }
}

#[async_trait]
impl Courier for EmailCourier {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        Ok(self.deliver(message).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn courier() -> EmailCourier {
        EmailCourier::new(EmailConfig {
            smtp_host: "smtp.example.org".to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            from_address: DEFAULT_FROM_ADDRESS.to_string(),
            smtp_user: None,
            smtp_password: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn builds_authenticated_transport_up_front() {
        let courier = EmailCourier::new(EmailConfig {
            smtp_host: "smtp.example.org".to_string(),
            smtp_port: 2525,
            from_address: "assembly@example.org".to_string(),
            smtp_user: Some("mailer".to_string()),
            smtp_password: Some("secret".to_string()),
        });
        assert!(courier.is_ok());
    }

    #[tokio::test]
    async fn builds_message_for_valid_recipient() {
        let message = OutboundMessage {
            to: "registrant@example.org".to_string(),
            subject: "You're invited".to_string(),
            body: "Hello".to_string(),
            reference: None,
        };
        assert!(courier().build_message(&message).is_ok());
    }

    #[tokio::test]
    async fn rejects_invalid_recipient() {
        let message = OutboundMessage {
            to: "not-an-email".to_string(),
            subject: "x".to_string(),
            body: "x".to_string(),
            reference: None,
        };
        let err = courier().build_message(&message).unwrap_err();
        assert!(err.to_string().contains("Email address parse error"));
    }

    #[test]
    fn email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }
}
