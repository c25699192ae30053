//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects with 403 when the role is
//! not in its allowed set.
//!
//! | Extractor         | Roles                                              |
//! |-------------------|----------------------------------------------------|
//! | `RequireAdmin`    | admin                                              |
//! | `RequireManager`  | admin, project_manager                             |
//! | `RequireReviewer` | admin, project_manager, client                     |
//! | `RequireCaller`   | admin, project_manager, confirmation_caller        |
//! | `RequireAuth`     | any authenticated user                             |

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use opendlp_core::error::CoreError;
use opendlp_core::roles::{role_in, CALLER_ROLES, MANAGER_ROLES, REVIEWER_ROLES, ROLE_ADMIN};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

async fn require_roles(
    parts: &mut Parts,
    state: &AppState,
    allowed: &[&str],
    message: &str,
) -> Result<AuthUser, AppError> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if !role_in(&user.role, allowed) {
        return Err(AppError::Core(CoreError::Forbidden(message.to_string())));
    }
    Ok(user)
}

/// Requires the `admin` role.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_roles(parts, state, &[ROLE_ADMIN], "Admin role required")
            .await
            .map(RequireAdmin)
    }
}

/// Requires a role that runs assemblies (`admin` or `project_manager`).
pub struct RequireManager(pub AuthUser);

impl FromRequestParts<AppState> for RequireManager {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_roles(parts, state, MANAGER_ROLES, "Project manager or Admin role required")
            .await
            .map(RequireManager)
    }
}

/// Requires a role that may read and review assemblies, including clients.
pub struct RequireReviewer(pub AuthUser);

impl FromRequestParts<AppState> for RequireReviewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_roles(parts, state, REVIEWER_ROLES, "Client, Project manager or Admin role required")
            .await
            .map(RequireReviewer)
    }
}

/// Requires a role that makes confirmation calls.
pub struct RequireCaller(pub AuthUser);

impl FromRequestParts<AppState> for RequireCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_roles(
            parts,
            state,
            CALLER_ROLES,
            "Confirmation caller, Project manager or Admin role required",
        )
        .await
        .map(RequireCaller)
    }
}

/// Requires any authenticated user (any valid role).
///
/// Same as [`AuthUser`], but reads as an explicit requirement in handler
/// signatures.
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(RequireAuth(user))
    }
}
