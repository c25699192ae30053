//! Handlers for `/assemblies`: specification, lifecycle, and summary.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use opendlp_core::assembly::{ensure_editable, validate_spec, validate_transition, AssemblyAction};
use opendlp_core::error::CoreError;
use opendlp_core::status::AssemblyStatus;
use opendlp_core::types::DbId;
use opendlp_db::models::assembly::{Assembly, AssemblySummary, CreateAssembly, UpdateAssembly};
use opendlp_db::repositories::AssemblyRepo;
use opendlp_events::{event_types, PlatformEvent};
use serde::Deserialize;
use serde_json::json;

use super::load_assembly;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireManager, RequireReviewer};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// `?status=` filter for `GET /assemblies`, by status name.
#[derive(Debug, Deserialize)]
pub struct AssemblyFilterParams {
    pub status: Option<String>,
}

/// Body of the client review actions.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewRequest {
    pub comment: Option<String>,
}

/// POST /api/v1/assemblies
pub async fn create_assembly(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Json(input): Json<CreateAssembly>,
) -> AppResult<(StatusCode, Json<Assembly>)> {
    validate_spec(
        Some(input.name.as_str()),
        Some(input.target_size),
        input.starts_on,
        input.ends_on,
    )?;
    let input = CreateAssembly {
        name: input.name.trim().to_string(),
        ..input
    };

    let assembly = AssemblyRepo::create(&state.pool, &input, Some(user.user_id)).await?;
    tracing::info!(assembly_id = assembly.id, user_id = user.user_id, "Assembly created");

    state.event_bus.publish(
        PlatformEvent::new(event_types::ASSEMBLY_CREATED)
            .with_source("assembly", assembly.id)
            .with_actor(user.user_id)
            .with_payload(json!({ "name": assembly.name, "target_size": assembly.target_size })),
    );

    Ok((StatusCode::CREATED, Json(assembly)))
}

/// GET /api/v1/assemblies
pub async fn list_assemblies(
    State(state): State<AppState>,
    RequireReviewer(_user): RequireReviewer,
    Query(page): Query<PaginationParams>,
    Query(filter): Query<AssemblyFilterParams>,
) -> AppResult<Json<DataResponse<Vec<Assembly>>>> {
    let status_id = match filter.status.as_deref() {
        Some(name) => Some(
            AssemblyStatus::from_name(name)
                .ok_or_else(|| {
                    AppError::BadRequest(format!("Unknown assembly status '{name}'"))
                })?
                .id(),
        ),
        None => None,
    };

    let data = AssemblyRepo::list(&state.pool, status_id, page.limit(), page.offset()).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/assemblies/{id}
pub async fn get_assembly(
    State(state): State<AppState>,
    RequireReviewer(_user): RequireReviewer,
    Path(id): Path<DbId>,
) -> AppResult<Json<Assembly>> {
    let (assembly, _) = load_assembly(&state.pool, id).await?;
    Ok(Json(assembly))
}

/// PUT /api/v1/assemblies/{id}
///
/// Only drafts can be edited.
pub async fn update_assembly(
    State(state): State<AppState>,
    RequireManager(_user): RequireManager,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateAssembly>,
) -> AppResult<Json<Assembly>> {
    let (current, status) = load_assembly(&state.pool, id).await?;
    ensure_editable(status)?;

    // Dates are checked against the merged result, not just the patch.
    validate_spec(
        input.name.as_deref(),
        input.target_size,
        input.starts_on.or(current.starts_on),
        input.ends_on.or(current.ends_on),
    )?;
    let input = UpdateAssembly {
        name: input.name.map(|n| n.trim().to_string()),
        ..input
    };

    let assembly = AssemblyRepo::update_draft(&state.pool, id, &input)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Assembly left draft while being edited".into(),
            ))
        })?;
    Ok(Json(assembly))
}

/// GET /api/v1/assemblies/{id}/summary
pub async fn get_summary(
    State(state): State<AppState>,
    RequireReviewer(_user): RequireReviewer,
    Path(id): Path<DbId>,
) -> AppResult<Json<AssemblySummary>> {
    load_assembly(&state.pool, id).await?;
    let summary = AssemblyRepo::summary(&state.pool, id).await?;
    Ok(Json(summary))
}

// ---------------------------------------------------------------------------
// Lifecycle actions
// ---------------------------------------------------------------------------

/// POST /api/v1/assemblies/{id}/submit
pub async fn submit(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Json<Assembly>> {
    apply_action(&state, &user, id, AssemblyAction::Submit, None).await
}

/// POST /api/v1/assemblies/{id}/approve
pub async fn approve(
    State(state): State<AppState>,
    RequireReviewer(user): RequireReviewer,
    Path(id): Path<DbId>,
    body: Option<Json<ReviewRequest>>,
) -> AppResult<Json<Assembly>> {
    let review = body.map(|Json(b)| b).unwrap_or_default();
    apply_action(&state, &user, id, AssemblyAction::Approve, review.comment).await
}

/// POST /api/v1/assemblies/{id}/request-changes
///
/// Sends the specification back to draft; the comment tells the manager why.
pub async fn request_changes(
    State(state): State<AppState>,
    RequireReviewer(user): RequireReviewer,
    Path(id): Path<DbId>,
    Json(review): Json<ReviewRequest>,
) -> AppResult<Json<Assembly>> {
    let comment = review
        .comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "A comment is required when requesting changes".into(),
            ))
        })?;
    apply_action(&state, &user, id, AssemblyAction::RequestChanges, Some(comment)).await
}

/// POST /api/v1/assemblies/{id}/open-registration
pub async fn open_registration(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Json<Assembly>> {
    apply_action(&state, &user, id, AssemblyAction::OpenRegistration, None).await
}

/// POST /api/v1/assemblies/{id}/close-registration
pub async fn close_registration(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Json<Assembly>> {
    apply_action(&state, &user, id, AssemblyAction::CloseRegistration, None).await
}

/// POST /api/v1/assemblies/{id}/complete
pub async fn complete(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Json<Assembly>> {
    apply_action(&state, &user, id, AssemblyAction::Complete, None).await
}

/// POST /api/v1/assemblies/{id}/archive
pub async fn archive(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Json<Assembly>> {
    apply_action(&state, &user, id, AssemblyAction::Archive, None).await
}

async fn apply_action(
    state: &AppState,
    user: &AuthUser,
    id: DbId,
    action: AssemblyAction,
    comment: Option<String>,
) -> AppResult<Json<Assembly>> {
    let (_, from) = load_assembly(&state.pool, id).await?;
    let to = action.target_status();
    validate_transition(from, to)?;

    let updated = if action.is_review() {
        AssemblyRepo::review(&state.pool, id, from, to, user.user_id, comment.as_deref()).await?
    } else {
        AssemblyRepo::transition(&state.pool, id, from, to).await?
    };
    let assembly = updated.ok_or_else(|| {
        AppError::Core(CoreError::Conflict(
            "Assembly status changed concurrently; reload and retry".into(),
        ))
    })?;

    tracing::info!(
        assembly_id = id,
        from = %from,
        to = %to,
        user_id = user.user_id,
        "Assembly status changed"
    );
    state.event_bus.publish(
        PlatformEvent::new(event_types::ASSEMBLY_STATUS_CHANGED)
            .with_source("assembly", id)
            .with_actor(user.user_id)
            .with_payload(json!({
                "from": from.as_str(),
                "to": to.as_str(),
                "comment": comment,
            })),
    );

    Ok(Json(assembly))
}
