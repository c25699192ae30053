//! Handlers for the `/admin` resource (user management).
//!
//! All handlers require the `admin` role via [`RequireAdmin`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use opendlp_core::error::CoreError;
use opendlp_core::types::DbId;
use opendlp_db::models::role::Role;
use opendlp_db::models::user::{CreateUser, UpdateUser, User, UserResponse};
use opendlp_db::repositories::{RefreshSessionRepo, RoleRepo, UserRepo};
use serde::Deserialize;
use validator::ValidateEmail;

use crate::auth::password::{hash_password, validate_password_strength};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /admin/users`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role_id: DbId,
}

/// Request body for `PUT /admin/users/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role_id: Option<DbId>,
    pub is_active: Option<bool>,
}

/// Request body for `POST /admin/users/{id}/reset-password`.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let username = input.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Username must not be empty".into(),
        )));
    }
    validate_email(&input.email)?;
    validate_password_strength(&input.password, state.config.min_password_length)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    let role = existing_role(&state, input.role_id).await?;

    let hashed = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username,
            email: input.email.trim().to_string(),
            password_hash: hashed,
            role_id: role.id,
        },
    )
    .await?;
    tracing::info!(user_id = user.id, role = %role.name, created_by = admin.user_id, "User created");

    Ok((StatusCode::CREATED, Json(UserResponse::from_user(&user, role.name))))
}

/// GET /api/v1/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let users = UserRepo::list(&state.pool).await?;
    // One role lookup for the whole list.
    let roles = RoleRepo::list(&state.pool).await?;

    let data = users
        .iter()
        .map(|u| UserResponse::from_user(u, role_name_in(&roles, u)))
        .collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<UserResponse>> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("User", id))?;
    user_to_response(&state, &user).await.map(Json)
}

/// PUT /api/v1/admin/users/{id}
///
/// Profile fields only; passwords go through `reset-password`.
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    if let Some(email) = &input.email {
        validate_email(email)?;
    }
    if let Some(role_id) = input.role_id {
        existing_role(&state, role_id).await?;
    }

    let update = UpdateUser {
        username: input.username.map(|u| u.trim().to_string()),
        email: input.email.map(|e| e.trim().to_string()),
        role_id: input.role_id,
        is_active: input.is_active,
    };
    let user = UserRepo::update(&state.pool, id, &update)
        .await?
        .ok_or(AppError::not_found("User", id))?;

    user_to_response(&state, &user).await.map(Json)
}

/// DELETE /api/v1/admin/users/{id}
///
/// Soft-deactivate and revoke the user's sessions. Returns 204 No Content.
pub async fn deactivate_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if id == admin.user_id {
        return Err(AppError::Core(CoreError::Conflict(
            "Administrators cannot deactivate their own account".into(),
        )));
    }
    if !UserRepo::deactivate(&state.pool, id).await? {
        return Err(AppError::not_found("User", id));
    }
    RefreshSessionRepo::revoke_for_user(&state.pool, id).await?;
    tracing::info!(user_id = id, deactivated_by = admin.user_id, "User deactivated");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/users/{id}/reset-password
///
/// Also clears any lockout and revokes existing sessions.
pub async fn reset_password(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<StatusCode> {
    validate_password_strength(&input.new_password, state.config.min_password_length)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let hashed = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    if !UserRepo::update_password(&state.pool, id, &hashed).await? {
        return Err(AppError::not_found("User", id));
    }
    RefreshSessionRepo::revoke_for_user(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_email(email: &str) -> AppResult<()> {
    if !email.trim().validate_email() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "'{email}' is not a valid email address"
        ))));
    }
    Ok(())
}

async fn existing_role(state: &AppState, role_id: DbId) -> AppResult<Role> {
    RoleRepo::find_by_id(&state.pool, role_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(format!("Unknown role id {role_id}")))
        })
}

fn role_name_in(roles: &[Role], user: &User) -> String {
    roles
        .iter()
        .find(|r| r.id == user.role_id)
        .map(|r| r.name.clone())
        .unwrap_or_else(|| "unknown".to_string())
}

async fn user_to_response(state: &AppState, user: &User) -> AppResult<UserResponse> {
    let role_name = super::resolve_role_name(&state.pool, user.role_id).await?;
    Ok(UserResponse::from_user(user, role_name))
}
