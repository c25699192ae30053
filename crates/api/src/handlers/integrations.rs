//! Webhooks from third-party services.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use opendlp_core::error::CoreError;
use opendlp_core::hashing::verify_hmac_sha256;
use opendlp_core::registration::RegistrationSource;

use super::registration::{register, CodedRegistrationRequest, RegistrationReceipt};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Header carrying the hex HMAC-SHA256 of the raw request body.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// POST /api/v1/integrations/pocket-receptionist/registrations
///
/// Pocket Receptionist takes registrations by phone and relays them here.
/// The endpoint does not exist unless `POCKET_RECEPTIONIST_SECRET` is set.
pub async fn pocket_receptionist_registration(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<(StatusCode, Json<RegistrationReceipt>)> {
    let secret = state
        .config
        .pocket_receptionist_secret
        .as_deref()
        .ok_or_else(|| AppError::NotFound("Pocket Receptionist integration is disabled".into()))?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Missing X-Signature header".into()))
        })?;
    if !verify_hmac_sha256(secret.as_bytes(), &body, signature.trim()) {
        tracing::warn!("Rejected Pocket Receptionist webhook with a bad signature");
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid webhook signature".into(),
        )));
    }

    let input: CodedRegistrationRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid registration payload: {e}")))?;

    let (registrant, assembly_name) = register(
        &state,
        &input.invite_code,
        input.details,
        RegistrationSource::Phone,
        None,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegistrationReceipt {
            registrant_id: registrant.id,
            assembly_name,
            status: "registered",
        }),
    ))
}
