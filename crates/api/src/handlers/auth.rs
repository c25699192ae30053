//! Handlers for the `/auth` resource (login, refresh, logout).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use opendlp_core::backup_codes::{hash_backup_code, looks_like_backup_code};
use opendlp_core::error::CoreError;
use opendlp_core::two_factor::verify_code;
use opendlp_core::types::DbId;
use opendlp_db::models::refresh_session::NewRefreshSession;
use opendlp_db::models::user::User;
use opendlp_db::repositories::{BackupCodeRepo, RefreshSessionRepo, UserRepo};
use serde::{Deserialize, Serialize};

use super::resolve_role_name;
use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Consecutive failed attempts that lock an account.
pub const MAX_FAILED_ATTEMPTS: i32 = 5;

/// How long a locked account stays locked.
pub const LOCK_DURATION_MINS: i64 = 15;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// TOTP code or unused backup code; required when 2FA is enabled.
    pub totp_code: Option<String>,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub role: String,
    pub totp_enabled: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Username + password, plus a second factor for accounts with 2FA enabled.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = UserRepo::find_by_username(&state.pool, &input.username)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    if let Some(locked_until) = user.locked_until {
        if locked_until > Utc::now() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Account is temporarily locked. Try again later.".into(),
            )));
        }
    }

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        record_failed_attempt(&state, &user).await?;
        return Err(invalid_credentials());
    }

    if user.totp_enabled {
        let code = input
            .totp_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Two-factor code required".into()))
            })?;

        if !check_second_factor(&state, &user, code).await? {
            record_failed_attempt(&state, &user).await?;
            return Err(AppError::Core(CoreError::Unauthorized(
                "Invalid two-factor code".into(),
            )));
        }
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;

    let role_name = resolve_role_name(&state.pool, user.role_id).await?;
    tracing::info!(user_id = user.id, role = %role_name, "User logged in");

    let response = create_auth_response(&state, &user, &role_name, None).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a refresh token for a new token pair. The presented token is
/// rotated out and cannot be redeemed again.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let token_hash = hash_refresh_token(&input.refresh_token);

    let session = RefreshSessionRepo::find_usable(&state.pool, &token_hash)
        .await?
        .ok_or_else(invalid_refresh_token)?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let role_name = resolve_role_name(&state.pool, user.role_id).await?;
    let response = create_auth_response(&state, &user, &role_name, Some(session.id)).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/logout
///
/// Revoke every session of the caller. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    let revoked = RefreshSessionRepo::revoke_for_user(&state.pool, auth_user.user_id).await?;
    tracing::debug!(user_id = auth_user.user_id, revoked, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn invalid_refresh_token() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Invalid or expired refresh token".into(),
    ))
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Invalid username or password".into(),
    ))
}

/// Bump the failure counter and lock the account once it reaches the limit.
async fn record_failed_attempt(state: &AppState, user: &User) -> AppResult<()> {
    let failures = UserRepo::increment_failed_login(&state.pool, user.id).await?;
    if failures >= MAX_FAILED_ATTEMPTS {
        let lock_until = Utc::now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
        UserRepo::lock_account(&state.pool, user.id, lock_until).await?;
        tracing::warn!(user_id = user.id, failures, "Account locked after failed logins");
    }
    Ok(())
}

/// Accept either a current TOTP code or an unused backup code (consumed on use).
async fn check_second_factor(state: &AppState, user: &User, code: &str) -> AppResult<bool> {
    if looks_like_backup_code(code) {
        let consumed =
            BackupCodeRepo::consume(&state.pool, user.id, &hash_backup_code(code)).await?;
        if consumed {
            tracing::info!(user_id = user.id, "Backup code used for login");
        }
        return Ok(consumed);
    }

    let Some(encrypted) = user.totp_secret_encrypted.as_deref() else {
        return Ok(false);
    };
    let secret = state.secrets.decrypt(encrypted)?;
    Ok(verify_code(&secret, code, Utc::now().timestamp()))
}

/// Sign tokens, persist the refresh session, and build the response.
///
/// `replaces` is the session being rotated on refresh; `None` at login.
async fn create_auth_response(
    state: &AppState,
    user: &User,
    role: &str,
    replaces: Option<DbId>,
) -> AppResult<AuthResponse> {
    let access_token = generate_access_token(user.id, role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();

    let session = NewRefreshSession {
        user_id: user.id,
        token_hash: refresh_hash,
        expires_at: Utc::now() + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days),
    };
    match replaces {
        None => {
            RefreshSessionRepo::issue(&state.pool, &session).await?;
        }
        // A concurrent refresh with the same token loses here.
        Some(previous) => {
            RefreshSessionRepo::rotate(&state.pool, previous, &session)
                .await?
                .ok_or_else(invalid_refresh_token)?;
        }
    }

    Ok(AuthResponse {
        access_token,
        refresh_token: refresh_plaintext,
        expires_in: state.config.jwt.access_token_ttl_secs(),
        user: UserInfo {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: role.to_string(),
            totp_enabled: user.totp_enabled,
        },
    })
}
