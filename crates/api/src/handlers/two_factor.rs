//! Handlers for `/auth/2fa`: TOTP enrolment and backup codes.

use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use opendlp_core::backup_codes::{backup_codes_file, generate_backup_codes, hash_backup_code};
use opendlp_core::error::CoreError;
use opendlp_core::two_factor::{encode_base32, generate_secret, provisioning_uri, verify_code};
use opendlp_core::types::DbId;
use opendlp_db::models::user::User;
use opendlp_db::repositories::{BackupCodeRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SetupResponse {
    /// Base32 secret for manual entry.
    pub secret: String,
    /// `otpauth://` URI, usually shown as a QR code.
    pub provisioning_uri: String,
}

#[derive(Debug, Deserialize)]
pub struct EnableRequest {
    pub code: String,
}

/// Body for the endpoints that need the account password again.
#[derive(Debug, Deserialize)]
pub struct PasswordConfirmation {
    pub password: String,
}

/// Freshly issued backup codes. Shown once; only hashes are kept.
#[derive(Debug, Serialize)]
pub struct BackupCodesResponse {
    pub backup_codes: Vec<String>,
}

/// POST /api/v1/auth/2fa/setup
///
/// Generate and store a new secret. 2FA stays off until `enable` confirms it.
pub async fn setup(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<SetupResponse>> {
    let user = current_user(&state, &auth).await?;
    if user.totp_enabled {
        return Err(AppError::Core(CoreError::Conflict(
            "Two-factor authentication is already enabled".into(),
        )));
    }

    let secret = generate_secret();
    let encrypted = state.secrets.encrypt(&secret)?;
    UserRepo::set_totp_secret(&state.pool, user.id, &encrypted).await?;

    Ok(Json(SetupResponse {
        secret: encode_base32(&secret),
        provisioning_uri: provisioning_uri(&state.config.totp_issuer, &user.username, &secret),
    }))
}

/// POST /api/v1/auth/2fa/enable
///
/// Confirm the pending secret with a code; returns the first set of backup codes.
pub async fn enable(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<EnableRequest>,
) -> AppResult<Json<BackupCodesResponse>> {
    let user = current_user(&state, &auth).await?;
    if user.totp_enabled {
        return Err(AppError::Core(CoreError::Conflict(
            "Two-factor authentication is already enabled".into(),
        )));
    }
    let encrypted = user.totp_secret_encrypted.as_deref().ok_or_else(|| {
        AppError::Core(CoreError::Conflict(
            "Run two-factor setup before enabling it".into(),
        ))
    })?;

    let secret = state.secrets.decrypt(encrypted)?;
    if !verify_code(&secret, &input.code, Utc::now().timestamp()) {
        return Err(AppError::Core(CoreError::Validation(
            "Invalid two-factor code".into(),
        )));
    }

    if !UserRepo::enable_totp(&state.pool, user.id).await? {
        return Err(AppError::not_found("User", user.id));
    }
    let codes = issue_backup_codes(&state, user.id).await?;
    tracing::info!(user_id = user.id, "Two-factor authentication enabled");

    Ok(Json(BackupCodesResponse {
        backup_codes: codes,
    }))
}

/// POST /api/v1/auth/2fa/disable
///
/// Requires the current password. Drops the secret and every backup code.
pub async fn disable(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<PasswordConfirmation>,
) -> AppResult<StatusCode> {
    let user = current_user(&state, &auth).await?;
    confirm_password(&user, &input.password)?;

    UserRepo::disable_totp(&state.pool, user.id).await?;
    tracing::info!(user_id = user.id, "Two-factor authentication disabled");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/2fa/backup-codes
///
/// Replace the backup code set. Earlier codes stop working. Requires the
/// current password so an access token alone cannot mint new codes.
pub async fn regenerate_backup_codes(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<PasswordConfirmation>,
) -> AppResult<Json<BackupCodesResponse>> {
    let user = enabled_user(&state, &auth).await?;
    confirm_password(&user, &input.password)?;
    let codes = issue_backup_codes(&state, user.id).await?;
    Ok(Json(BackupCodesResponse {
        backup_codes: codes,
    }))
}

/// POST /api/v1/auth/2fa/backup-codes/download
///
/// Same as [`regenerate_backup_codes`] but answers with `2fa-backup-codes.txt`.
pub async fn download_backup_codes(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<PasswordConfirmation>,
) -> AppResult<Response> {
    let user = enabled_user(&state, &auth).await?;
    confirm_password(&user, &input.password)?;
    let codes = issue_backup_codes(&state, user.id).await?;
    let file = backup_codes_file(&codes);

    Ok((
        [
            (CONTENT_TYPE, file.mime_type.to_string()),
            (CONTENT_DISPOSITION, file.content_disposition()),
        ],
        file.content,
    )
        .into_response())
}

async fn current_user(state: &AppState, auth: &AuthUser) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))
}

async fn enabled_user(state: &AppState, auth: &AuthUser) -> AppResult<User> {
    let user = current_user(state, auth).await?;
    if !user.totp_enabled {
        return Err(AppError::Core(CoreError::Conflict(
            "Two-factor authentication is not enabled".into(),
        )));
    }
    Ok(user)
}

fn confirm_password(user: &User, password: &str) -> AppResult<()> {
    let valid = verify_password(password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !valid {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Password is incorrect".into(),
        )));
    }
    Ok(())
}

async fn issue_backup_codes(state: &AppState, user_id: DbId) -> AppResult<Vec<String>> {
    let codes = generate_backup_codes();
    let hashes: Vec<String> = codes.iter().map(|c| hash_backup_code(c)).collect();
    BackupCodeRepo::replace_for_user(&state.pool, user_id, &hashes).await?;
    Ok(codes)
}
