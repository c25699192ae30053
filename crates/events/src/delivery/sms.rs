//! SMS delivery through the TextMagic REST API.

use std::time::Duration;

use async_trait::async_trait;

use super::{Channel, Courier, DeliveryError, OutboundMessage};

const DEFAULT_BASE_URL: &str = "https://rest.textmagic.com/api/v2";

/// HTTP request timeout for a single send.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("TextMagic returned HTTP {0}")]
    HttpStatus(u16),
}

/// TextMagic account settings.
#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub username: String,
    pub api_key: String,
    pub base_url: String,
}

impl SmsConfig {
    /// Load from `TEXTMAGIC_USERNAME`, `TEXTMAGIC_API_KEY`, and optional
    /// `TEXTMAGIC_BASE_URL`. Returns `None` unless both credentials are set.
    pub fn from_env() -> Option<Self> {
        let username = std::env::var("TEXTMAGIC_USERNAME").ok()?;
        let api_key = std::env::var("TEXTMAGIC_API_KEY").ok()?;
        Some(Self {
            username,
            api_key,
            base_url: std::env::var("TEXTMAGIC_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        })
    }

    pub fn messages_url(&self) -> String {
        format!("{}/messages", self.base_url.trim_end_matches('/'))
    }
}

/// Sends text messages; the subject line is dropped.
pub struct SmsCourier {
    config: SmsConfig,
    client: reqwest::Client,
}

impl SmsCourier {
    pub fn new(config: SmsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { config, client }
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<(), SmsError> {
        let response = self
            .client
            .post(self.config.messages_url())
            .header("X-TM-Username", &self.config.username)
            .header("X-TM-Key", &self.config.api_key)
            .json(&serde_json::json!({
                "text": message.body,
                "phones": message.to,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SmsError::HttpStatus(response.status().as_u16()));
        }
        tracing::info!(reference = message.reference.as_deref().unwrap_or(""), "SMS sent");
        Ok(())
    }
}

#[async_trait]
impl Courier for SmsCourier {
    fn channel(&self) -> Channel {
        Channel::Sms
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        Ok(self.deliver(message).await?)
    }
}
