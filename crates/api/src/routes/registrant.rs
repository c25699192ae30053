//! Route definitions for the `/registrants` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{confirmation, registrant, registration};
use crate::state::AppState;

/// Routes mounted at `/registrants`.
///
/// ```text
/// POST   /                       -> registration::register_keyed_in
/// GET    /{id}                   -> get_registrant
/// POST   /{id}/withdraw          -> withdraw_registrant
/// GET    /{id}/confirmations     -> confirmation::list_calls
/// POST   /{id}/confirmations     -> confirmation::record_call
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(registration::register_keyed_in))
        .route("/{id}", get(registrant::get_registrant))
        .route("/{id}/withdraw", post(registrant::withdraw_registrant))
        .route(
            "/{id}/confirmations",
            get(confirmation::list_calls).post(confirmation::record_call),
        )
}
