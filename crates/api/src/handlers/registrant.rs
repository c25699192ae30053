//! Handlers for reading and withdrawing registrants.

use axum::extract::{Path, Query, State};
use axum::Json;
use opendlp_core::error::CoreError;
use opendlp_core::registration::ensure_can_withdraw;
use opendlp_core::status::{ConfirmationStatus, RegistrationStatus, SelectionStatus, StatusId};
use opendlp_core::types::DbId;
use opendlp_db::models::registrant::{Registrant, RegistrantFilter};
use opendlp_db::repositories::RegistrantRepo;
use opendlp_events::{event_types, PlatformEvent};
use serde::Deserialize;
use serde_json::json;

use super::load_assembly;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireCaller, RequireManager};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Status filters for `GET /assemblies/{id}/registrants`, by status name.
#[derive(Debug, Default, Deserialize)]
pub struct RegistrantFilterParams {
    pub registration: Option<String>,
    pub selection: Option<String>,
    pub confirmation: Option<String>,
}

impl RegistrantFilterParams {
    fn resolve(&self) -> AppResult<RegistrantFilter> {
        Ok(RegistrantFilter {
            registration_status_id: status_id(
                "registration",
                self.registration.as_deref(),
                |n| RegistrationStatus::from_name(n).map(RegistrationStatus::id),
            )?,
            selection_status_id: status_id("selection", self.selection.as_deref(), |n| {
                SelectionStatus::from_name(n).map(SelectionStatus::id)
            })?,
            confirmation_status_id: status_id(
                "confirmation",
                self.confirmation.as_deref(),
                |n| ConfirmationStatus::from_name(n).map(ConfirmationStatus::id),
            )?,
        })
    }
}

fn status_id(
    kind: &str,
    name: Option<&str>,
    lookup: impl Fn(&str) -> Option<StatusId>,
) -> AppResult<Option<StatusId>> {
    name.map(|n| {
        lookup(n).ok_or_else(|| AppError::BadRequest(format!("Unknown {kind} status '{n}'")))
    })
    .transpose()
}

/// GET /api/v1/assemblies/{id}/registrants
pub async fn list_registrants(
    State(state): State<AppState>,
    RequireManager(_user): RequireManager,
    Path(assembly_id): Path<DbId>,
    Query(page): Query<PaginationParams>,
    Query(filter): Query<RegistrantFilterParams>,
) -> AppResult<Json<DataResponse<Vec<Registrant>>>> {
    load_assembly(&state.pool, assembly_id).await?;
    let filter = filter.resolve()?;
    let data = RegistrantRepo::list_by_assembly(
        &state.pool,
        assembly_id,
        filter,
        page.limit(),
        page.offset(),
    )
    .await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/registrants/{id}
pub async fn get_registrant(
    State(state): State<AppState>,
    RequireCaller(_user): RequireCaller,
    Path(id): Path<DbId>,
) -> AppResult<Json<Registrant>> {
    let registrant = RegistrantRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Registrant", id))?;
    Ok(Json(registrant))
}

/// POST /api/v1/registrants/{id}/withdraw
///
/// Withdrawn registrants are excluded from every later selection run.
pub async fn withdraw_registrant(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Json<Registrant>> {
    let current = RegistrantRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Registrant", id))?;
    if let Some(status) = current.registration_status() {
        ensure_can_withdraw(status)?;
    }

    let registrant = RegistrantRepo::withdraw(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Registrant has already withdrawn".into(),
            ))
        })?;

    tracing::info!(registrant_id = id, user_id = user.user_id, "Registrant withdrawn");
    state.event_bus.publish(
        PlatformEvent::new(event_types::REGISTRANT_WITHDRAWN)
            .with_source("registrant", id)
            .with_actor(user.user_id)
            .with_payload(json!({
                "assembly_id": registrant.assembly_id,
                "was_selected": current.selection_status() == Some(SelectionStatus::Selected),
            })),
    );

    Ok(Json(registrant))
}
