//! Handlers for confirmation calls to selected registrants.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use opendlp_core::confirmation::{ensure_callable, validate_notes, CallOutcome};
use opendlp_core::error::CoreError;
use opendlp_core::types::DbId;
use opendlp_db::models::confirmation::{ConfirmationRecord, CreateConfirmationRecord};
use opendlp_db::models::registrant::Registrant;
use opendlp_db::repositories::{ConfirmationRepo, RegistrantRepo};
use opendlp_events::{event_types, PlatformEvent};
use serde::Deserialize;
use serde_json::json;

use super::load_assembly;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireCaller;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /registrants/{id}/confirmations`.
#[derive(Debug, Deserialize)]
pub struct RecordCallRequest {
    /// `confirmed`, `declined`, `no_answer` or `callback_requested`.
    pub outcome: String,
    pub notes: Option<String>,
    /// Replaces the registrant's recorded needs when present.
    pub needs: Option<String>,
}

/// POST /api/v1/registrants/{id}/confirmations
pub async fn record_call(
    State(state): State<AppState>,
    RequireCaller(user): RequireCaller,
    Path(registrant_id): Path<DbId>,
    Json(input): Json<RecordCallRequest>,
) -> AppResult<(StatusCode, Json<ConfirmationRecord>)> {
    let outcome = CallOutcome::parse(&input.outcome)?;
    let notes = non_blank(input.notes);
    let needs = non_blank(input.needs);
    validate_notes(notes.as_deref(), needs.as_deref())?;

    let registrant = find_registrant(&state, registrant_id).await?;
    let (registration, selection) = registrant
        .registration_status()
        .zip(registrant.selection_status())
        .ok_or_else(|| {
            AppError::Core(CoreError::Internal(format!(
                "Registrant {registrant_id} has an unknown status"
            )))
        })?;
    ensure_callable(registration, selection)?;

    let resulting = outcome.resulting_status();
    let record = ConfirmationRepo::record(
        &state.pool,
        &CreateConfirmationRecord {
            registrant_id,
            caller_id: Some(user.user_id),
            outcome: outcome.as_str().to_string(),
            notes,
            needs,
            resulting_status_id: resulting.id(),
        },
    )
    .await?;

    tracing::info!(
        registrant_id,
        caller_id = user.user_id,
        outcome = outcome.as_str(),
        "Confirmation call recorded"
    );
    state.event_bus.publish(
        PlatformEvent::new(event_types::CONFIRMATION_RECORDED)
            .with_source("registrant", registrant_id)
            .with_actor(user.user_id)
            .with_payload(json!({
                "assembly_id": registrant.assembly_id,
                "outcome": outcome.as_str(),
                "confirmation_status": resulting.as_str(),
            })),
    );

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/registrants/{id}/confirmations
///
/// Call history, oldest first.
pub async fn list_calls(
    State(state): State<AppState>,
    RequireCaller(_user): RequireCaller,
    Path(registrant_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ConfirmationRecord>>>> {
    find_registrant(&state, registrant_id).await?;
    let data = ConfirmationRepo::list_by_registrant(&state.pool, registrant_id).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/assemblies/{id}/call-list
///
/// Selected registrants still to be confirmed come first.
pub async fn call_list(
    State(state): State<AppState>,
    RequireCaller(_user): RequireCaller,
    Path(assembly_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Registrant>>>> {
    load_assembly(&state.pool, assembly_id).await?;
    let data = RegistrantRepo::call_list(&state.pool, assembly_id).await?;
    Ok(Json(DataResponse { data }))
}

async fn find_registrant(state: &AppState, id: DbId) -> AppResult<Registrant> {
    RegistrantRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Registrant", id))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
