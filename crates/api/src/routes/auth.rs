//! Route definitions for the `/auth` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::{auth, two_factor};
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /login                       -> login
/// POST /refresh                     -> refresh
/// POST /logout                      -> logout (requires auth)
/// POST /2fa/setup                   -> setup
/// POST /2fa/enable                  -> enable
/// POST /2fa/disable                 -> disable
/// POST /2fa/backup-codes            -> regenerate_backup_codes
/// POST /2fa/backup-codes/download   -> download_backup_codes
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/2fa/setup", post(two_factor::setup))
        .route("/2fa/enable", post(two_factor::enable))
        .route("/2fa/disable", post(two_factor::disable))
        .route("/2fa/backup-codes", post(two_factor::regenerate_backup_codes))
        .route(
            "/2fa/backup-codes/download",
            post(two_factor::download_backup_codes),
        )
}
