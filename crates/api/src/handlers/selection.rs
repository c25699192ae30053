//! Handlers for selection runs (sortition).

use std::collections::{BTreeMap, HashMap};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use opendlp_core::assembly::ensure_accepts_selection;
use opendlp_core::error::CoreError;
use opendlp_core::registration::ContactChannel;
use opendlp_core::selection::{generate_seed, select, Candidate, SelectionRequest, Stratification};
use opendlp_core::types::DbId;
use opendlp_db::models::registrant::Registrant;
use opendlp_db::models::selection::{CreateSelectionRun, SelectionRun, SelectionRunMember};
use opendlp_db::repositories::{RegistrantRepo, SelectionRunRepo};
use opendlp_events::{event_types, templates, Channel, OutboundMessage, PlatformEvent};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{deliver_all, load_assembly, DeliveryTally, Notice};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireManager, RequireReviewer};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /assemblies/{id}/selection-runs`.
#[derive(Debug, Deserialize)]
pub struct RunSelectionRequest {
    pub target: u32,
    /// Replays an earlier draw when given; otherwise a fresh seed is generated.
    pub seed: Option<i64>,
    pub stratification: Option<Stratification>,
}

#[derive(Debug, Serialize)]
pub struct SelectionRunResponse {
    pub run: SelectionRun,
    /// Registrant ids in rank order.
    pub selected: Vec<DbId>,
    pub notifications_sent: usize,
    pub notifications_skipped: usize,
    pub notifications_failed: usize,
}

#[derive(Debug, Serialize)]
pub struct SelectionRunDetail {
    pub run: SelectionRun,
    pub members: Vec<SelectionRunMember>,
}

/// POST /api/v1/assemblies/{id}/selection-runs
///
/// Draws from registered registrants still in the pool. Those chosen move
/// to `selected` and are notified on their preferred channel.
pub async fn run_selection(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(assembly_id): Path<DbId>,
    Json(input): Json<RunSelectionRequest>,
) -> AppResult<(StatusCode, Json<SelectionRunResponse>)> {
    let (assembly, status) = load_assembly(&state.pool, assembly_id).await?;
    ensure_accepts_selection(status)?;

    let seed = match input.seed {
        Some(seed) if seed < 0 => {
            return Err(AppError::Core(CoreError::Validation(
                "seed must not be negative".into(),
            )))
        }
        Some(seed) => seed,
        None => generate_seed(),
    };

    let registrants = RegistrantRepo::selectable_pool(&state.pool, assembly_id).await?;
    let candidates: Vec<Candidate> = registrants.iter().map(to_candidate).collect();
    let request = SelectionRequest {
        target: input.target,
        stratification: input.stratification,
    };
    let outcome = select(&candidates, &request, seed)?;

    let stratification = request
        .stratification
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| AppError::InternalError(format!("Stratification encoding error: {e}")))?;

    let run = SelectionRunRepo::create_with_members(
        &state.pool,
        &CreateSelectionRun {
            assembly_id,
            seed,
            target_count: request.target as i32,
            pool_size: outcome.pool_size as i32,
            stratification,
            run_by: Some(user.user_id),
        },
        &outcome.selected,
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::Conflict(
            "The registrant pool changed during selection; run it again".into(),
        ))
    })?;

    tracing::info!(
        run_id = run.id,
        assembly_id,
        seed,
        pool_size = outcome.pool_size,
        selected = outcome.selected.len(),
        "Selection run completed"
    );
    state.event_bus.publish(
        PlatformEvent::new(event_types::SELECTION_RUN_COMPLETED)
            .with_source("selection_run", run.id)
            .with_actor(user.user_id)
            .with_payload(json!({
                "assembly_id": assembly_id,
                "seed": seed,
                "selected": outcome.selected.len(),
            })),
    );

    let by_id: HashMap<DbId, &Registrant> = registrants.iter().map(|r| (r.id, r)).collect();
    let notices: Vec<Notice> = outcome
        .selected
        .iter()
        .filter_map(|id| by_id.get(id).copied())
        .map(|registrant| (registrant.id, selection_notice(&assembly.name, registrant)))
        .collect();
    let outcomes = deliver_all(&state.outreach, "selection_notice", notices).await;
    let tally = DeliveryTally::count(&outcomes);

    Ok((
        StatusCode::CREATED,
        Json(SelectionRunResponse {
            run,
            selected: outcome.selected,
            notifications_sent: tally.sent,
            notifications_skipped: tally.skipped,
            notifications_failed: tally.failed,
        }),
    ))
}

/// GET /api/v1/assemblies/{id}/selection-runs
pub async fn list_runs(
    State(state): State<AppState>,
    RequireReviewer(_user): RequireReviewer,
    Path(assembly_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<SelectionRun>>>> {
    load_assembly(&state.pool, assembly_id).await?;
    let data = SelectionRunRepo::list_by_assembly(&state.pool, assembly_id).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/selection-runs/{id}
pub async fn get_run(
    State(state): State<AppState>,
    RequireReviewer(_user): RequireReviewer,
    Path(id): Path<DbId>,
) -> AppResult<Json<SelectionRunDetail>> {
    let run = SelectionRunRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("SelectionRun", id))?;
    let members = SelectionRunRepo::list_members(&state.pool, id).await?;
    Ok(Json(SelectionRunDetail { run, members }))
}

/// Only string attribute values take part in stratification.
fn to_candidate(registrant: &Registrant) -> Candidate {
    let attributes: BTreeMap<String, String> = registrant
        .attributes
        .as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();
    Candidate {
        id: registrant.id,
        attributes,
    }
}

/// Courier channel and address for a registrant's preferred contact.
fn notice_route(registrant: &Registrant) -> Option<(Channel, &str)> {
    let preferred = ContactChannel::parse(&registrant.preferred_channel).ok()?;
    match preferred {
        ContactChannel::Email => registrant.email.as_deref().map(|to| (Channel::Email, to)),
        ContactChannel::Phone => registrant.phone.as_deref().map(|to| (Channel::Sms, to)),
        ContactChannel::Post => registrant
            .postal_address
            .as_deref()
            .map(|to| (Channel::Post, to)),
    }
}

/// The notice for one selected registrant, or `None` without a usable address.
fn selection_notice(
    assembly_name: &str,
    registrant: &Registrant,
) -> Option<(Channel, OutboundMessage)> {
    let (channel, to) = notice_route(registrant)?;
    let message = templates::selection_notice(assembly_name, &registrant.full_name(), to);
    Some((channel, message))
}
