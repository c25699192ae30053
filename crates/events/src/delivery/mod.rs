//! Outbound delivery to registrants and invitees.
//!
//! Each external service (SMTP email, TextMagic SMS, print fulfillment) is a
//! [`Courier`]. [`Outreach`] holds at most one courier per [`Channel`] and
//! reports [`DeliveryOutcome::NotConfigured`] instead of failing when a
//! channel has none.

pub mod email;
pub mod print;
pub mod sms;

use std::sync::Arc;

use async_trait::async_trait;

use email::EmailError;
use print::PrintError;
use sms::SmsError;

/// Where a message is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Email,
    Sms,
    /// Printed letter, posted by the fulfillment service.
    Post,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::Post => "post",
        }
    }
}

/// A rendered message addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Email address, phone number, or postal address depending on channel.
    pub to: String,
    pub subject: String,
    pub body: String,
    /// Caller-side correlation id (e.g. the invite code).
    pub reference: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Email(#[from] EmailError),

    #[error(transparent)]
    Sms(#[from] SmsError),

    #[error(transparent)]
    Print(#[from] PrintError),
}

/// Result of handing a message to [`Outreach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    /// No courier is configured for the channel; nothing was attempted.
    NotConfigured,
}

/// An external service that delivers [`OutboundMessage`]s on one channel.
#[async_trait]
pub trait Courier: Send + Sync {
    fn channel(&self) -> Channel;

    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError>;
}

/// The configured couriers, at most one per channel.
#[derive(Clone, Default)]
pub struct Outreach {
    email: Option<Arc<dyn Courier>>,
    sms: Option<Arc<dyn Courier>>,
    post: Option<Arc<dyn Courier>>,
}

impl Outreach {
    /// Outreach with no couriers; every send reports `NotConfigured`.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Build couriers for every channel whose environment is configured.
    pub fn from_env() -> Self {
        let mut outreach = Self::default();
        if let Some(config) = email::EmailConfig::from_env() {
            match email::EmailCourier::new(config) {
                Ok(courier) => outreach = outreach.with_courier(Arc::new(courier)),
                Err(e) => tracing::error!(error = %e, "Email courier disabled: invalid SMTP settings"),
            }
        }
        if let Some(config) = sms::SmsConfig::from_env() {
            outreach = outreach.with_courier(Arc::new(sms::SmsCourier::new(config)));
        }
        if let Some(config) = print::PrintConfig::from_env() {
            outreach = outreach.with_courier(Arc::new(print::PrintCourier::new(config)));
        }
        tracing::info!(
            email = outreach.is_configured(Channel::Email),
            sms = outreach.is_configured(Channel::Sms),
            post = outreach.is_configured(Channel::Post),
            "Outreach couriers configured"
        );
        outreach
    }

    /// Install `courier` for its channel, replacing any previous one.
    pub fn with_courier(mut self, courier: Arc<dyn Courier>) -> Self {
        match courier.channel() {
            Channel::Email => self.email = Some(courier),
            Channel::Sms => self.sms = Some(courier),
            Channel::Post => self.post = Some(courier),
        }
        self
    }

    fn courier(&self, channel: Channel) -> Option<&Arc<dyn Courier>> {
        match channel {
            Channel::Email => self.email.as_ref(),
            Channel::Sms => self.sms.as_ref(),
            Channel::Post => self.post.as_ref(),
        }
    }

    pub fn is_configured(&self, channel: Channel) -> bool {
        self.courier(channel).is_some()
    }

    pub async fn send(
        &self,
        channel: Channel,
        message: &OutboundMessage,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        let Some(courier) = self.courier(channel) else {
            tracing::debug!(channel = channel.as_str(), "No courier configured, skipping");
            return Ok(DeliveryOutcome::NotConfigured);
        };
        courier.send(message).await?;
        Ok(DeliveryOutcome::Sent)
    }
}
