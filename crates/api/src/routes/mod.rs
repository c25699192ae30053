pub mod admin;
pub mod assembly;
pub mod auth;
pub mod health;
pub mod integrations;
pub mod invite;
pub mod registrant;
pub mod registration;
pub mod selection;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login | /auth/refresh | /auth/logout
/// /auth/2fa/setup | enable | disable | backup-codes | backup-codes/download
///
/// /admin/users                                   list, create (admin only)
/// /admin/users/{id}                              get, update, deactivate
/// /admin/users/{id}/reset-password               reset password
///
/// /assemblies                                    list, create
/// /assemblies/{id}                               get, update (draft only)
/// /assemblies/{id}/{action}                      lifecycle actions (POST)
/// /assemblies/{id}/summary                       counters
/// /assemblies/{id}/invite-batches                list, create
/// /assemblies/{id}/registrants                   list
/// /assemblies/{id}/selection-runs                list, run
/// /assemblies/{id}/call-list                     confirmation call list
///
/// /invite-batches/{id}                           get
/// /invite-batches/{id}/invites                   list
/// /invite-batches/{id}/dispatch                  send (POST)
///
/// /registrants                                   keyed-in registration (POST)
/// /registrants/{id}                              get
/// /registrants/{id}/withdraw                     withdraw (POST)
/// /registrants/{id}/confirmations                list, record call
///
/// /register/{code}                               public invite lookup, registration
///
/// /selection-runs/{id}                           run with members
///
/// /integrations/pocket-receptionist/registrations   signed phone registrations
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Authentication and two-factor enrolment.
        .nest("/auth", auth::router())
        // User management.
        .nest("/admin", admin::router())
        // Assembly specification, lifecycle, and assembly-scoped collections.
        .nest("/assemblies", assembly::router())
        .nest("/invite-batches", invite::router())
        .nest("/registrants", registrant::router())
        // Public registration by invite code (no auth).
        .nest("/register", registration::router())
        .nest("/selection-runs", selection::router())
        // Signed third-party webhooks.
        .nest("/integrations", integrations::router())
}
