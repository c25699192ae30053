//! Route definitions for the `/invite-batches` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::invite;
use crate::state::AppState;

/// Routes mounted at `/invite-batches`.
///
/// ```text
/// GET    /{id}             -> get_batch
/// GET    /{id}/invites     -> list_invites
/// POST   /{id}/dispatch    -> dispatch_batch
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(invite::get_batch))
        .route("/{id}/invites", get(invite::list_invites))
        .route("/{id}/dispatch", post(invite::dispatch_batch))
}
