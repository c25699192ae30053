//! Shared helpers for the API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use opendlp_core::status::AssemblyStatus;
use opendlp_core::types::DbId;
use opendlp_db::models::assembly::CreateAssembly;
use opendlp_db::models::user::{CreateUser, User};
use opendlp_db::repositories::{AssemblyRepo, RoleRepo, UserRepo};
use opendlp_events::delivery::email::EmailError;
use opendlp_events::{Channel, Courier, DeliveryError, EventBus, OutboundMessage, Outreach};
use sqlx::PgPool;
use tower::ServiceExt;

use opendlp_api::auth::jwt::JwtConfig;
use opendlp_api::auth::password::hash_password;
use opendlp_api::config::ServerConfig;
use opendlp_api::router::build_app_router;
use opendlp_api::state::AppState;
use opendlp_core::secrets::SecretBox;

pub const TEST_PASSWORD: &str = "test_password_123!";
pub const TEST_WEBHOOK_SECRET: &str = "test-webhook-secret";
const TEST_TOTP_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

/// A `ServerConfig` with safe defaults for tests.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-jwt-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        totp_encryption_key: TEST_TOTP_KEY.to_string(),
        totp_issuer: "OpenDLP".to_string(),
        public_base_url: "https://register.example.org".to_string(),
        min_password_length: 12,
        pocket_receptionist_secret: Some(TEST_WEBHOOK_SECRET.to_string()),
        session_cleanup_interval_secs: 3600,
    }
}

/// The production router over `pool`, with no couriers configured.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, Outreach::disabled())
}

/// The production router over `pool`, delivering through `outreach`.
pub fn build_test_app_with(pool: PgPool, outreach: Outreach) -> Router {
    let config = test_config();
    let secrets = SecretBox::from_hex_key(&config.totp_encryption_key).unwrap();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::new(EventBus::default()),
        outreach,
        secrets: Arc::new(secrets),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

fn json_request(
    method: Method,
    uri: &str,
    body: &serde_json::Value,
    token: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, &body, None)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request(Method::POST, uri, &body, Some(token))).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request(Method::PUT, uri, &body, Some(token))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// POST `raw` with an optional `x-signature` header, as a webhook sender would.
pub async fn post_signed(
    app: Router,
    uri: &str,
    raw: Vec<u8>,
    signature: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("x-signature", signature);
    }
    send(app, builder.body(Body::from(raw)).unwrap()).await
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a user with [`TEST_PASSWORD`] and the named role.
pub async fn create_user(pool: &PgPool, username: &str, role_name: &str) -> User {
    let role = RoleRepo::find_by_name(pool, role_name)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("role {role_name} should be seeded"));
    let input = CreateUser {
        username: username.to_string(),
        email: format!("{username}@test.org"),
        password_hash: hash_password(TEST_PASSWORD).unwrap(),
        role_id: role.id,
    };
    UserRepo::create(pool, &input).await.unwrap()
}

/// Log in through the API and return the full JSON response.
pub async fn login(pool: &PgPool, username: &str, password: &str) -> serde_json::Value {
    let body = serde_json::json!({ "username": username, "password": password });
    let response = post_json(build_test_app(pool.clone()), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK, "login as {username} failed");
    body_json(response).await
}

/// Create a user with `role_name` and return an access token for them.
pub async fn token_for(pool: &PgPool, username: &str, role_name: &str) -> String {
    create_user(pool, username, role_name).await;
    let json = login(pool, username, TEST_PASSWORD).await;
    json["access_token"].as_str().unwrap().to_string()
}

/// Insert an assembly directly and force it into `status`.
pub async fn create_assembly_in(pool: &PgPool, name: &str, status: AssemblyStatus) -> DbId {
    let assembly = AssemblyRepo::create(
        pool,
        &CreateAssembly {
            name: name.to_string(),
            description: Some("A citizens' assembly".to_string()),
            location: Some("Town Hall".to_string()),
            starts_on: None,
            ends_on: None,
            target_size: 4,
        },
        None,
    )
    .await
    .unwrap();
    if status != AssemblyStatus::Draft {
        sqlx::query("UPDATE assemblies SET status_id = $2 WHERE id = $1")
            .bind(assembly.id)
            .bind(status.id())
            .execute(pool)
            .await
            .unwrap();
    }
    assembly.id
}

/// Force an assembly's status, bypassing the workflow.
pub async fn set_assembly_status(pool: &PgPool, assembly_id: DbId, status: AssemblyStatus) {
    sqlx::query("UPDATE assemblies SET status_id = $2 WHERE id = $1")
        .bind(assembly_id)
        .bind(status.id())
        .execute(pool)
        .await
        .unwrap();
}

/// Create an email invite batch through the API and return its invite codes.
pub async fn create_email_batch(
    pool: &PgPool,
    token: &str,
    assembly_id: DbId,
    recipients: &[&str],
) -> (DbId, Vec<String>) {
    let body = serde_json::json!({
        "label": "First mailing",
        "channel": "email",
        "recipients": recipients,
    });
    let response = post_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/assemblies/{assembly_id}/invite-batches"),
        body,
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let batch_id = json["batch"]["id"].as_i64().unwrap();
    let codes = json["invites"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["code"].as_str().unwrap().to_string())
        .collect();
    (batch_id, codes)
}

/// A valid public registration body.
pub fn registration_body(first_name: &str, email: &str) -> serde_json::Value {
    serde_json::json!({
        "first_name": first_name,
        "last_name": "Tester",
        "email": email,
        "preferred_channel": "email",
        "attributes": { "gender": "female", "age_band": "30-44" },
    })
}

/// Register against `code` through the public endpoint; returns the registrant id.
pub async fn register(pool: &PgPool, code: &str, body: serde_json::Value) -> DbId {
    let response = post_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/register/{code}"),
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["registrant_id"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Couriers
// ---------------------------------------------------------------------------

/// Records every message; fails for recipients containing `fail`.
pub struct RecordingCourier {
    channel: Channel,
    sent: Mutex<Vec<OutboundMessage>>,
}

impl RecordingCourier {
    pub fn new(channel: Channel) -> Arc<Self> {
        Arc::new(Self {
            channel,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Courier for RecordingCourier {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        if message.to.contains("fail") {
            return Err(EmailError::Build("rejected by test courier".to_string()).into());
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}
