//! Two-factor enrolment, login with a second factor, and backup codes.

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::{body_json, body_text, create_user, login, post_json, post_json_auth, TEST_PASSWORD};
use opendlp_core::roles::ROLE_PROJECT_MANAGER;
use opendlp_core::two_factor::{code_at, decode_base32};
use sqlx::PgPool;

/// Enrol `username` in 2FA. Returns (access token, raw secret, backup codes).
async fn enrol(pool: &PgPool, username: &str) -> (String, Vec<u8>, Vec<String>) {
    create_user(pool, username, ROLE_PROJECT_MANAGER).await;
    let token = login(pool, username, TEST_PASSWORD).await["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/2fa/setup",
        serde_json::json!({}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let uri = json["provisioning_uri"].as_str().unwrap();
    assert!(uri.starts_with("otpauth://totp/"));
    assert!(uri.contains("issuer=OpenDLP"));
    let secret = decode_base32(json["secret"].as_str().unwrap()).unwrap();

    let code = code_at(&secret, Utc::now().timestamp());
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/2fa/enable",
        serde_json::json!({ "code": code }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let codes = body_json(response).await["backup_codes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap().to_string())
        .collect();

    (token, secret, codes)
}

async fn login_with(pool: &PgPool, username: &str, totp_code: Option<&str>) -> StatusCode {
    let body = serde_json::json!({
        "username": username,
        "password": TEST_PASSWORD,
        "totp_code": totp_code,
    });
    post_json(common::build_test_app(pool.clone()), "/api/v1/auth/login", body)
        .await
        .status()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn enabling_issues_ten_backup_codes(pool: PgPool) {
    let (_, _, codes) = enrol(&pool, "enroller").await;

    assert_eq!(codes.len(), 10);
    assert!(codes.iter().all(|c| c.len() == 9 && c.as_bytes()[4] == b'-'));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn enable_rejects_wrong_code(pool: PgPool) {
    create_user(&pool, "fumbler", ROLE_PROJECT_MANAGER).await;
    let token = login(&pool, "fumbler", TEST_PASSWORD).await["access_token"]
        .as_str()
        .unwrap()
        .to_string();
    post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/2fa/setup",
        serde_json::json!({}),
        &token,
    )
    .await;

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/auth/2fa/enable",
        serde_json::json!({ "code": "not-a-code" }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn enable_without_setup_conflicts(pool: PgPool) {
    create_user(&pool, "hasty", ROLE_PROJECT_MANAGER).await;
    let token = login(&pool, "hasty", TEST_PASSWORD).await["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/auth/2fa/enable",
        serde_json::json!({ "code": "123456" }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_requires_second_factor_once_enabled(pool: PgPool) {
    let (_, secret, _) = enrol(&pool, "guarded").await;

    assert_eq!(login_with(&pool, "guarded", None).await, StatusCode::UNAUTHORIZED);
    assert_eq!(
        login_with(&pool, "guarded", Some("000000")).await,
        StatusCode::UNAUTHORIZED
    );

    let code = code_at(&secret, Utc::now().timestamp());
    assert_eq!(login_with(&pool, "guarded", Some(&code)).await, StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn backup_code_works_exactly_once(pool: PgPool) {
    let (_, _, codes) = enrol(&pool, "backupuser").await;
    let code = codes[0].to_lowercase();

    assert_eq!(login_with(&pool, "backupuser", Some(&code)).await, StatusCode::OK);
    assert_eq!(
        login_with(&pool, "backupuser", Some(&code)).await,
        StatusCode::UNAUTHORIZED
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn regenerating_invalidates_old_codes(pool: PgPool) {
    let (token, _, old_codes) = enrol(&pool, "regen").await;

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/2fa/backup-codes",
        serde_json::json!({ "password": TEST_PASSWORD }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let new_codes = body_json(response).await["backup_codes"].clone();

    assert_eq!(
        login_with(&pool, "regen", Some(&old_codes[0])).await,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        login_with(&pool, "regen", new_codes[0].as_str()).await,
        StatusCode::OK
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn backup_codes_need_the_account_password(pool: PgPool) {
    let (token, _, codes) = enrol(&pool, "stolen").await;

    for uri in [
        "/api/v1/auth/2fa/backup-codes",
        "/api/v1/auth/2fa/backup-codes/download",
    ] {
        let response = post_json_auth(
            common::build_test_app(pool.clone()),
            uri,
            serde_json::json!({ "password": "not-the-password" }),
            &token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");

        let response = post_json_auth(
            common::build_test_app(pool.clone()),
            uri,
            serde_json::json!({}),
            &token,
        )
        .await;
        assert!(response.status().is_client_error(), "{uri} accepted a missing password");
    }

    // The original set is untouched.
    assert_eq!(
        login_with(&pool, "stolen", Some(&codes[0])).await,
        StatusCode::OK
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn download_returns_text_attachment(pool: PgPool) {
    let (token, _, _) = enrol(&pool, "downloader").await;

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/auth/2fa/backup-codes/download",
        serde_json::json!({ "password": TEST_PASSWORD }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));
    let disposition = response.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("2fa-backup-codes.txt"));

    let text = body_text(response).await;
    assert_eq!(text.lines().filter(|l| !l.trim().is_empty()).count(), 10);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn backup_codes_need_2fa_enabled(pool: PgPool) {
    create_user(&pool, "plain", ROLE_PROJECT_MANAGER).await;
    let token = login(&pool, "plain", TEST_PASSWORD).await["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/auth/2fa/backup-codes",
        serde_json::json!({ "password": TEST_PASSWORD }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn disable_requires_password(pool: PgPool) {
    let (token, _, _) = enrol(&pool, "disabler").await;

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/2fa/disable",
        serde_json::json!({ "password": "wrong-password-here" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/2fa/disable",
        serde_json::json!({ "password": TEST_PASSWORD }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(login_with(&pool, "disabler", None).await, StatusCode::OK);
}
