//! HTTP handlers, one module per resource.

pub mod admin;
pub mod assembly;
pub mod auth;
pub mod confirmation;
pub mod integrations;
pub mod invite;
pub mod registrant;
pub mod registration;
pub mod selection;
pub mod two_factor;

use futures::stream::{self, StreamExt};
use opendlp_core::error::CoreError;
use opendlp_core::status::AssemblyStatus;
use opendlp_core::types::DbId;
use opendlp_db::models::assembly::Assembly;
use opendlp_db::repositories::{AssemblyRepo, RoleRepo};
use opendlp_events::{Channel, DeliveryOutcome, OutboundMessage, Outreach};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};

/// Messages in flight at once during a bulk send.
pub const DISPATCH_CONCURRENCY: usize = 8;

/// Load an assembly and decode its status, or 404.
pub(crate) async fn load_assembly(
    pool: &PgPool,
    id: DbId,
) -> AppResult<(Assembly, AssemblyStatus)> {
    let assembly = AssemblyRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::not_found("Assembly", id))?;
    let status = assembly.status().ok_or_else(|| {
        AppError::Core(CoreError::Internal(format!(
            "Assembly {id} has unknown status id {}",
            assembly.status_id
        )))
    })?;
    Ok((assembly, status))
}

/// Resolve a role id to its name.
pub(crate) async fn resolve_role_name(pool: &PgPool, role_id: DbId) -> AppResult<String> {
    RoleRepo::find_by_id(pool, role_id)
        .await?
        .map(|r| r.name)
        .ok_or_else(|| {
            AppError::Core(CoreError::Internal(format!("Role {role_id} does not exist")))
        })
}

/// Result of handing one message to its courier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Sent,
    /// No address for the channel, or no courier configured.
    Skipped,
    Failed,
}

/// A message owned outright, keyed by the row it concerns.
///
/// `None` marks a recipient with no usable address.
pub(crate) type Notice = (DbId, Option<(Channel, OutboundMessage)>);

/// Send every notice, at most [`DISPATCH_CONCURRENCY`] at a time.
///
/// Courier errors are logged and reported as [`Delivery::Failed`].
pub(crate) async fn deliver_all(
    outreach: &Outreach,
    kind: &'static str,
    notices: Vec<Notice>,
) -> Vec<(DbId, Delivery)> {
    stream::iter(notices)
        .map(|(row_id, notice)| {
            let outreach = outreach.clone();
            async move {
                let Some((channel, message)) = notice else {
                    return (row_id, Delivery::Skipped);
                };
                let delivery = match outreach.send(channel, &message).await {
                    Ok(DeliveryOutcome::Sent) => Delivery::Sent,
                    Ok(DeliveryOutcome::NotConfigured) => Delivery::Skipped,
                    Err(e) => {
                        tracing::warn!(row_id, kind, error = %e, "Delivery failed");
                        Delivery::Failed
                    }
                };
                (row_id, delivery)
            }
        })
        .buffer_unordered(DISPATCH_CONCURRENCY)
        .collect()
        .await
}

/// Sent, skipped and failed counts over a bulk send.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DeliveryTally {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DeliveryTally {
    pub fn count(outcomes: &[(DbId, Delivery)]) -> Self {
        outcomes
            .iter()
            .fold(Self::default(), |mut tally, (_, delivery)| {
                match delivery {
                    Delivery::Sent => tally.sent += 1,
                    Delivery::Skipped => tally.skipped += 1,
                    Delivery::Failed => tally.failed += 1,
                }
                tally
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use opendlp_events::{Courier, DeliveryError};

    use super::*;

    struct AcceptAll;

    #[async_trait]
    impl Courier for AcceptAll {
        fn channel(&self) -> Channel {
            Channel::Email
        }

        async fn send(&self, _message: &OutboundMessage) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    fn message(to: &str) -> OutboundMessage {
        OutboundMessage {
            to: to.into(),
            subject: "Selected".into(),
            body: "You have been selected.".into(),
            reference: None,
        }
    }

    #[tokio::test]
    async fn notices_are_sent_or_skipped_by_channel() {
        let outreach = Outreach::disabled().with_courier(Arc::new(AcceptAll));
        let notices: Vec<Notice> = vec![
            (1, Some((Channel::Email, message("a@example.org")))),
            (2, Some((Channel::Sms, message("+447700900123")))),
            (3, None),
        ];

        let mut outcomes = deliver_all(&outreach, "test", notices).await;
        outcomes.sort_by_key(|(id, _)| *id);

        assert_eq!(
            outcomes,
            vec![(1, Delivery::Sent), (2, Delivery::Skipped), (3, Delivery::Skipped)]
        );
        assert_eq!(
            DeliveryTally::count(&outcomes),
            DeliveryTally { sent: 1, skipped: 2, failed: 0 }
        );
    }
}
