use axum::routing::get;
use axum::Router;

use crate::handlers::selection;
use crate::state::AppState;

/// Routes mounted at `/selection-runs`.
///
/// ```text
/// GET    /{id}    -> get_run
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(selection::get_run))
}
