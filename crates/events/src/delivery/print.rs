//! Printed letters through the print fulfillment webhook.
//!
//! Each letter is POSTed as JSON with an `X-Signature` header holding the
//! hex HMAC-SHA256 of the body. Failed attempts are retried with exponential
//! backoff (1 s, 2 s, 4 s).

use std::time::Duration;

use async_trait::async_trait;
use opendlp_core::hashing::hmac_sha256_hex;

use super::{Channel, Courier, DeliveryError, OutboundMessage};

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "X-Signature";

#[derive(Debug, thiserror::Error)]
pub enum PrintError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Print service returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Print payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct PrintConfig {
    pub url: String,
    pub secret: String,
}

impl PrintConfig {
    /// Load from `PRINT_FULFILLMENT_URL` and `PRINT_FULFILLMENT_SECRET`.
    pub fn from_env() -> Option<Self> {
        Some(Self {
            url: std::env::var("PRINT_FULFILLMENT_URL").ok()?,
            secret: std::env::var("PRINT_FULFILLMENT_SECRET").ok()?,
        })
    }
}

/// Sends letters to the print-and-post service.
pub struct PrintCourier {
    config: PrintConfig,
    client: reqwest::Client,
}

impl PrintCourier {
    pub fn new(config: PrintConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { config, client }
    }

    /// Serialized request body and its signature.
    pub fn signed_body(&self, message: &OutboundMessage) -> Result<(Vec<u8>, String), PrintError> {
        let body = serde_json::to_vec(&serde_json::json!({
            "reference": message.reference,
            "address": message.to,
            "subject": message.subject,
            "letter": message.body,
        }))?;
        let signature = hmac_sha256_hex(self.config.secret.as_bytes(), &body);
        Ok((body, signature))
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<(), PrintError> {
        let (body, signature) = self.signed_body(message)?;

        let mut last_err: Option<PrintError> = None;
        for (attempt, delay_secs) in RETRY_DELAYS_SECS.iter().enumerate() {
            match self.try_send(&body, &signature).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        error = %e,
                        "Print fulfillment attempt failed, retrying"
                    );
                    last_err = Some(e);
                    tokio::time::sleep(Duration::from_secs(*delay_secs)).await;
                }
            }
        }

        match self.try_send(&body, &signature).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(error = %e, "Print fulfillment failed after all retries");
                Err(last_err.unwrap_or(e))
            }
        }
    }

    async fn try_send(&self, body: &[u8], signature: &str) -> Result<(), PrintError> {
        let response = self
            .client
            .post(&self.config.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(body.to_vec())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PrintError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl Courier for PrintCourier {
    fn channel(&self) -> Channel {
        Channel::Post
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        Ok(self.deliver(message).await?)
    }
}

#[cfg(test)]
mod tests {
    use opendlp_core::hashing::verify_hmac_sha256;

    use super::*;

    #[test]
    fn body_signature_verifies_with_shared_secret() {
        let courier = PrintCourier::new(PrintConfig {
            url: "https://print.example.org/letters".to_string(),
            secret: "shared-secret".to_string(),
        });
        let message = OutboundMessage {
            to: "1 High Street\nTownsville".to_string(),
            subject: "Invitation".to_string(),
            body: "Dear resident".to_string(),
            reference: Some("ABCD2345".to_string()),
        };

        let (body, signature) = courier.signed_body(&message).unwrap();
        assert!(verify_hmac_sha256(b"shared-secret", &body, &signature));
        assert!(!verify_hmac_sha256(b"other", &body, &signature));

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["reference"], "ABCD2345");
    }

    #[test]
    fn error_display() {
        assert_eq!(PrintError::HttpStatus(502).to_string(), "Print service returned HTTP 502");
    }
}
