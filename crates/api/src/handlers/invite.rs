//! Handlers for invite batches and their invites.
//!
//! A batch is created with its full recipient list; each recipient gets an
//! invite with a unique code. Dispatch hands every pending invite to the
//! courier for the batch channel.

use std::collections::HashSet;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use opendlp_core::assembly::ensure_accepts_invites;
use opendlp_core::error::CoreError;
use opendlp_core::invites::{
    generate_invite_code, registration_url, validate_recipients, InviteChannel,
};
use opendlp_core::types::DbId;
use opendlp_db::models::invite::{CreateInviteBatch, Invite, InviteBatch, NewInvite};
use opendlp_db::repositories::{InviteBatchRepo, InviteRepo};
use opendlp_events::{event_types, templates, Channel, OutboundMessage, PlatformEvent};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{deliver_all, load_assembly, Delivery, DeliveryTally, Notice};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireManager;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /assemblies/{id}/invite-batches`.
#[derive(Debug, Deserialize)]
pub struct CreateBatchRequest {
    pub label: String,
    /// `email` or `post`.
    pub channel: String,
    /// Email addresses or postal address blocks, one per invite.
    pub recipients: Vec<String>,
}

/// An invite plus the URL its QR code encodes.
#[derive(Debug, Serialize)]
pub struct InviteView {
    #[serde(flatten)]
    pub invite: Invite,
    pub registration_url: String,
}

#[derive(Debug, Serialize)]
pub struct BatchCreatedResponse {
    pub batch: InviteBatch,
    pub invites: Vec<InviteView>,
}

#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub batch: InviteBatch,
    /// Handed to the courier.
    pub sent: usize,
    /// No courier configured for the channel.
    pub skipped: usize,
    /// The courier returned an error; these invites stay pending.
    pub failed: usize,
}

/// POST /api/v1/assemblies/{id}/invite-batches
pub async fn create_batch(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(assembly_id): Path<DbId>,
    Json(input): Json<CreateBatchRequest>,
) -> AppResult<(StatusCode, Json<BatchCreatedResponse>)> {
    let (_, status) = load_assembly(&state.pool, assembly_id).await?;
    ensure_accepts_invites(status)?;

    let label = input.label.trim().to_string();
    if label.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Batch label must not be empty".into(),
        )));
    }
    let channel = InviteChannel::parse(&input.channel)?;
    validate_recipients(channel, &input.recipients)?;

    let new_invites = assign_codes(&input.recipients);
    let (batch, invites) = InviteBatchRepo::create_with_invites(
        &state.pool,
        &CreateInviteBatch {
            assembly_id,
            label,
            channel: channel.as_str().to_string(),
            created_by: Some(user.user_id),
        },
        &new_invites,
    )
    .await?;

    tracing::info!(
        batch_id = batch.id,
        assembly_id,
        channel = channel.as_str(),
        invites = invites.len(),
        "Invite batch created"
    );
    state.event_bus.publish(
        PlatformEvent::new(event_types::INVITE_BATCH_CREATED)
            .with_source("invite_batch", batch.id)
            .with_actor(user.user_id)
            .with_payload(json!({
                "assembly_id": assembly_id,
                "channel": channel.as_str(),
                "invites": invites.len(),
            })),
    );

    let invites = invites
        .into_iter()
        .map(|i| to_view(&state, i))
        .collect();
    Ok((StatusCode::CREATED, Json(BatchCreatedResponse { batch, invites })))
}

/// GET /api/v1/assemblies/{id}/invite-batches
pub async fn list_batches(
    State(state): State<AppState>,
    RequireManager(_user): RequireManager,
    Path(assembly_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<InviteBatch>>>> {
    load_assembly(&state.pool, assembly_id).await?;
    let data = InviteBatchRepo::list_by_assembly(&state.pool, assembly_id).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/invite-batches/{id}
pub async fn get_batch(
    State(state): State<AppState>,
    RequireManager(_user): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Json<InviteBatch>> {
    let batch = InviteBatchRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("InviteBatch", id))?;
    Ok(Json(batch))
}

/// GET /api/v1/invite-batches/{id}/invites
pub async fn list_invites(
    State(state): State<AppState>,
    RequireManager(_user): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<InviteView>>>> {
    InviteBatchRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("InviteBatch", id))?;
    let data = InviteRepo::list_by_batch(&state.pool, id)
        .await?
        .into_iter()
        .map(|i| to_view(&state, i))
        .collect();
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/invite-batches/{id}/dispatch
///
/// A batch is dispatched once; a second call returns 409. If recording the
/// sends fails, the claim is released so the pending invites can be retried.
pub async fn dispatch_batch(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Json<DispatchResponse>> {
    let batch = InviteBatchRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("InviteBatch", id))?;
    let (assembly, status) = load_assembly(&state.pool, batch.assembly_id).await?;
    ensure_accepts_invites(status)?;
    let channel = InviteChannel::parse(&batch.channel)?;

    let pending = InviteRepo::list_pending_by_batch(&state.pool, id).await?;
    let notices: Vec<Notice> = pending
        .iter()
        .map(|invite| {
            let url = registration_url(&state.config.public_base_url, &invite.code);
            (invite.id, Some(invite_message(channel, &assembly.name, invite, &url)))
        })
        .collect();

    let batch = InviteBatchRepo::mark_dispatched(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Invite batch has already been dispatched".into(),
            ))
        })?;

    let outcomes = deliver_all(&state.outreach, "invite", notices).await;
    let sent_ids: Vec<DbId> = outcomes
        .iter()
        .filter(|(_, d)| *d == Delivery::Sent)
        .map(|(id, _)| *id)
        .collect();
    if let Err(e) = InviteRepo::mark_dispatched(&state.pool, &sent_ids).await {
        if let Err(release) = InviteBatchRepo::release_claim(&state.pool, id).await {
            tracing::error!(batch_id = id, error = %release, "Failed to release batch claim");
        }
        return Err(e.into());
    }

    let DeliveryTally {
        sent,
        skipped,
        failed,
    } = DeliveryTally::count(&outcomes);

    tracing::info!(batch_id = id, sent, skipped, failed, "Invite batch dispatched");
    state.event_bus.publish(
        PlatformEvent::new(event_types::INVITE_BATCH_DISPATCHED)
            .with_source("invite_batch", id)
            .with_actor(user.user_id)
            .with_payload(json!({ "sent": sent, "skipped": skipped, "failed": failed })),
    );

    Ok(Json(DispatchResponse {
        batch,
        sent,
        skipped,
        failed,
    }))
}

/// One unique code per recipient.
fn assign_codes(recipients: &[String]) -> Vec<NewInvite> {
    let mut seen = HashSet::with_capacity(recipients.len());
    recipients
        .iter()
        .map(|recipient| {
            let code = loop {
                let candidate = generate_invite_code();
                if seen.insert(candidate.clone()) {
                    break candidate;
                }
            };
            NewInvite {
                code,
                recipient: recipient.trim().to_string(),
            }
        })
        .collect()
}

fn invite_message(
    channel: InviteChannel,
    assembly_name: &str,
    invite: &Invite,
    url: &str,
) -> (Channel, OutboundMessage) {
    match channel {
        InviteChannel::Email => (
            Channel::Email,
            templates::invite_email(assembly_name, &invite.recipient, url, &invite.code),
        ),
        InviteChannel::Post => (
            Channel::Post,
            templates::invite_letter(assembly_name, &invite.recipient, url, &invite.code),
        ),
    }
}

fn to_view(state: &AppState, invite: Invite) -> InviteView {
    let registration_url = registration_url(&state.config.public_base_url, &invite.code);
    InviteView {
        invite,
        registration_url,
    }
}
