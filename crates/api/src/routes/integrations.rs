//! Route definitions for third-party webhooks.

use axum::routing::post;
use axum::Router;

use crate::handlers::integrations;
use crate::state::AppState;

/// Routes mounted at `/integrations`. Authenticated by request signature.
///
/// ```text
/// POST   /pocket-receptionist/registrations   -> pocket_receptionist_registration
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/pocket-receptionist/registrations",
        post(integrations::pocket_receptionist_registration),
    )
}
