//! Public registration routes. No authentication.

use axum::routing::get;
use axum::Router;

use crate::handlers::registration;
use crate::state::AppState;

/// Routes mounted at `/register`.
///
/// ```text
/// GET    /{code}    -> lookup_invite
/// POST   /{code}    -> register_public
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{code}",
        get(registration::lookup_invite).post(registration::register_public),
    )
}
