//! Route definitions for the `/assemblies` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{assembly, confirmation, invite, registrant, selection};
use crate::state::AppState;

/// Routes mounted at `/assemblies`.
///
/// ```text
/// GET    /                               -> list_assemblies
/// POST   /                               -> create_assembly
/// GET    /{id}                           -> get_assembly
/// PUT    /{id}                           -> update_assembly
/// POST   /{id}/submit                    -> submit
/// POST   /{id}/approve                   -> approve
/// POST   /{id}/request-changes           -> request_changes
/// POST   /{id}/open-registration         -> open_registration
/// POST   /{id}/close-registration        -> close_registration
/// POST   /{id}/complete                  -> complete
/// POST   /{id}/archive                   -> archive
/// GET    /{id}/summary                   -> get_summary
///
/// GET    /{id}/invite-batches            -> invite::list_batches
/// POST   /{id}/invite-batches            -> invite::create_batch
/// GET    /{id}/registrants               -> registrant::list_registrants
/// GET    /{id}/selection-runs            -> selection::list_runs
/// POST   /{id}/selection-runs            -> selection::run_selection
/// GET    /{id}/call-list                 -> confirmation::call_list
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(assembly::list_assemblies).post(assembly::create_assembly),
        )
        .route(
            "/{id}",
            get(assembly::get_assembly).put(assembly::update_assembly),
        )
        .route("/{id}/submit", post(assembly::submit))
        .route("/{id}/approve", post(assembly::approve))
        .route("/{id}/request-changes", post(assembly::request_changes))
        .route("/{id}/open-registration", post(assembly::open_registration))
        .route("/{id}/close-registration", post(assembly::close_registration))
        .route("/{id}/complete", post(assembly::complete))
        .route("/{id}/archive", post(assembly::archive))
        .route("/{id}/summary", get(assembly::get_summary))
        .route(
            "/{id}/invite-batches",
            get(invite::list_batches).post(invite::create_batch),
        )
        .route("/{id}/registrants", get(registrant::list_registrants))
        .route(
            "/{id}/selection-runs",
            get(selection::list_runs).post(selection::run_selection),
        )
        .route("/{id}/call-list", get(confirmation::call_list))
}
