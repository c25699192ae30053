//! Invite batches, dispatch, and registration by invite code.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_assembly_in, create_email_batch, get, get_auth, post_json, post_json_auth,
    register, registration_body, set_assembly_status, token_for, RecordingCourier,
};
use opendlp_core::roles::{ROLE_CLIENT, ROLE_PROJECT_MANAGER};
use opendlp_core::status::{AssemblyStatus, InviteBatchStatus, InviteStatus};
use opendlp_events::{Channel, Outreach};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn batch_creates_one_unique_code_per_recipient(pool: PgPool) {
    let manager = token_for(&pool, "pm", ROLE_PROJECT_MANAGER).await;
    let assembly = create_assembly_in(&pool, "Housing", AssemblyStatus::Approved).await;

    let body = serde_json::json!({
        "label": "Ward 1 letters",
        "channel": "post",
        "recipients": ["1 High St\nTown", "2 High St\nTown", "3 High St\nTown"],
    });
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/assemblies/{assembly}/invite-batches"),
        body,
        &manager,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["batch"]["channel"], "post");
    let invites = json["invites"].as_array().unwrap();
    assert_eq!(invites.len(), 3);

    let mut codes: Vec<&str> = invites.iter().map(|i| i["code"].as_str().unwrap()).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), 3);
    for invite in invites {
        let code = invite["code"].as_str().unwrap();
        assert_eq!(
            invite["registration_url"],
            format!("https://register.example.org/register/{code}")
        );
        assert_eq!(invite["status_id"], InviteStatus::Pending.id());
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn batch_rejected_before_approval(pool: PgPool) {
    let manager = token_for(&pool, "pm", ROLE_PROJECT_MANAGER).await;
    let assembly = create_assembly_in(&pool, "Housing", AssemblyStatus::InReview).await;

    let body = serde_json::json!({
        "label": "Too early",
        "channel": "email",
        "recipients": ["a@example.org"],
    });
    let response = post_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/assemblies/{assembly}/invite-batches"),
        body,
        &manager,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn batch_validates_recipients_and_label(pool: PgPool) {
    let manager = token_for(&pool, "pm", ROLE_PROJECT_MANAGER).await;
    let assembly = create_assembly_in(&pool, "Housing", AssemblyStatus::Approved).await;
    let uri = format!("/api/v1/assemblies/{assembly}/invite-batches");

    for body in [
        serde_json::json!({ "label": "Empty", "channel": "email", "recipients": [] }),
        serde_json::json!({ "label": "Bad", "channel": "email", "recipients": ["not-an-email"] }),
        serde_json::json!({ "label": " ", "channel": "email", "recipients": ["a@example.org"] }),
        serde_json::json!({ "label": "Fax", "channel": "fax", "recipients": ["a@example.org"] }),
    ] {
        let response = post_json_auth(common::build_test_app(pool.clone()), &uri, body, &manager).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn client_cannot_create_batches(pool: PgPool) {
    let client = token_for(&pool, "client", ROLE_CLIENT).await;
    let assembly = create_assembly_in(&pool, "Housing", AssemblyStatus::Approved).await;

    let body = serde_json::json!({
        "label": "Nope",
        "channel": "email",
        "recipients": ["a@example.org"],
    });
    let response = post_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/assemblies/{assembly}/invite-batches"),
        body,
        &client,
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn dispatch_reports_sent_and_failed(pool: PgPool) {
    let manager = token_for(&pool, "pm", ROLE_PROJECT_MANAGER).await;
    let assembly = create_assembly_in(&pool, "Housing", AssemblyStatus::RegistrationOpen).await;
    let (batch, codes) = create_email_batch(
        &pool,
        &manager,
        assembly,
        &["ann@example.org", "fail@example.org", "bob@example.org"],
    )
    .await;

    let courier = RecordingCourier::new(Channel::Email);
    let app = common::build_test_app_with(
        pool.clone(),
        Outreach::disabled().with_courier(courier.clone()),
    );
    let response = post_json_auth(
        app,
        &format!("/api/v1/invite-batches/{batch}/dispatch"),
        serde_json::json!({}),
        &manager,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["sent"], 2);
    assert_eq!(json["failed"], 1);
    assert_eq!(json["skipped"], 0);

    let sent = courier.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|m| m.body.contains("https://register.example.org/register/")));
    assert!(sent
        .iter()
        .all(|m| codes.contains(m.reference.as_ref().unwrap())));

    // The failed invite is still pending.
    let response = get_auth(
        common::build_test_app(pool),
        &format!("/api/v1/invite-batches/{batch}/invites"),
        &manager,
    )
    .await;
    let json = body_json(response).await;
    for invite in json["data"].as_array().unwrap() {
        let expected = if invite["recipient"] == "fail@example.org" {
            InviteStatus::Pending
        } else {
            InviteStatus::Dispatched
        };
        assert_eq!(invite["status_id"], expected.id());
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn dispatch_without_courier_skips_everything(pool: PgPool) {
    let manager = token_for(&pool, "pm", ROLE_PROJECT_MANAGER).await;
    let assembly = create_assembly_in(&pool, "Housing", AssemblyStatus::Approved).await;
    let (batch, _) = create_email_batch(&pool, &manager, assembly, &["a@example.org", "b@example.org"]).await;

    let response = post_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/invite-batches/{batch}/dispatch"),
        serde_json::json!({}),
        &manager,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["sent"], 0);
    assert_eq!(json["skipped"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn batch_is_dispatched_only_once(pool: PgPool) {
    let manager = token_for(&pool, "pm", ROLE_PROJECT_MANAGER).await;
    let assembly = create_assembly_in(&pool, "Housing", AssemblyStatus::Approved).await;
    let (batch, _) = create_email_batch(&pool, &manager, assembly, &["a@example.org"]).await;
    let uri = format!("/api/v1/invite-batches/{batch}/dispatch");

    let first = post_json_auth(common::build_test_app(pool.clone()), &uri, serde_json::json!({}), &manager).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = post_json_auth(common::build_test_app(pool), &uri, serde_json::json!({}), &manager).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_dispatch_can_be_retried(pool: PgPool) {
    let manager = token_for(&pool, "pm", ROLE_PROJECT_MANAGER).await;
    let assembly = create_assembly_in(&pool, "Housing", AssemblyStatus::RegistrationOpen).await;
    let (batch, _) =
        create_email_batch(&pool, &manager, assembly, &["ann@example.org", "bob@example.org"]).await;
    let uri = format!("/api/v1/invite-batches/{batch}/dispatch");

    // Recording the sends fails after the batch has been claimed.
    sqlx::query(
        "CREATE FUNCTION reject_invite_updates() RETURNS trigger AS $$
         BEGIN RAISE EXCEPTION 'invites are read-only'; END;
         $$ LANGUAGE plpgsql",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "CREATE TRIGGER reject_invite_updates BEFORE UPDATE ON invites
         FOR EACH ROW EXECUTE FUNCTION reject_invite_updates()",
    )
    .execute(&pool)
    .await
    .unwrap();

    let courier = RecordingCourier::new(Channel::Email);
    let outreach = Outreach::disabled().with_courier(courier.clone());
    let response = post_json_auth(
        common::build_test_app_with(pool.clone(), outreach.clone()),
        &uri,
        serde_json::json!({}),
        &manager,
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = get_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/invite-batches/{batch}"),
        &manager,
    )
    .await;
    assert_eq!(
        body_json(response).await["status_id"],
        InviteBatchStatus::Draft.id()
    );

    sqlx::query("DROP TRIGGER reject_invite_updates ON invites")
        .execute(&pool)
        .await
        .unwrap();

    let response = post_json_auth(
        common::build_test_app_with(pool.clone(), outreach),
        &uri,
        serde_json::json!({}),
        &manager,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["sent"], 2);

    let response = get_auth(
        common::build_test_app(pool),
        &format!("/api/v1/invite-batches/{batch}/invites"),
        &manager,
    )
    .await;
    let json = body_json(response).await;
    assert!(json["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|invite| invite["status_id"] == InviteStatus::Dispatched.id()));
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn lookup_shows_assembly_without_auth(pool: PgPool) {
    let manager = token_for(&pool, "pm", ROLE_PROJECT_MANAGER).await;
    let assembly = create_assembly_in(&pool, "Housing", AssemblyStatus::RegistrationOpen).await;
    let (_, codes) = create_email_batch(&pool, &manager, assembly, &["a@example.org"]).await;

    // Codes are accepted in lower case with separators.
    let typed = format!("{}-{}", &codes[0][..4], &codes[0][4..]).to_lowercase();
    let response = get(common::build_test_app(pool), &format!("/api/v1/register/{typed}")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["code"], codes[0].as_str());
    assert_eq!(json["assembly_name"], "Housing");
    assert_eq!(json["registration_open"], true);
    assert_eq!(json["already_registered"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn public_registration_succeeds_once_per_invite(pool: PgPool) {
    let manager = token_for(&pool, "pm", ROLE_PROJECT_MANAGER).await;
    let assembly = create_assembly_in(&pool, "Housing", AssemblyStatus::RegistrationOpen).await;
    let (_, codes) = create_email_batch(&pool, &manager, assembly, &["a@example.org"]).await;

    let registrant_id = register(&pool, &codes[0], registration_body("Ann", "Ann@Example.org")).await;

    let response = get_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/registrants/{registrant_id}"),
        &manager,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["email"], "ann@example.org");
    assert_eq!(json["source"], "web");
    assert_eq!(json["attributes"]["gender"], "female");

    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/register/{}", codes[0]),
        registration_body("Ann", "ann@example.org"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = get_auth(
        common::build_test_app(pool),
        &format!("/api/v1/assemblies/{assembly}/summary"),
        &manager,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["invites_total"], 1);
    assert_eq!(json["invites_responded"], 1);
    assert_eq!(json["registered"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn registration_requires_open_assembly(pool: PgPool) {
    let manager = token_for(&pool, "pm", ROLE_PROJECT_MANAGER).await;
    let assembly = create_assembly_in(&pool, "Housing", AssemblyStatus::Approved).await;
    let (_, codes) = create_email_batch(&pool, &manager, assembly, &["a@example.org"]).await;

    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/register/{}", codes[0]),
        registration_body("Ann", "ann@example.org"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    set_assembly_status(&pool, assembly, AssemblyStatus::RegistrationClosed).await;
    let response = post_json(
        common::build_test_app(pool),
        &format!("/api/v1/register/{}", codes[0]),
        registration_body("Ann", "ann@example.org"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_and_malformed_codes(pool: PgPool) {
    let response = get(common::build_test_app(pool.clone()), "/api/v1/register/ABCD2345").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(common::build_test_app(pool), "/api/v1/register/short").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn registration_validates_contact_details(pool: PgPool) {
    let manager = token_for(&pool, "pm", ROLE_PROJECT_MANAGER).await;
    let assembly = create_assembly_in(&pool, "Housing", AssemblyStatus::RegistrationOpen).await;
    let (_, codes) = create_email_batch(&pool, &manager, assembly, &["a@example.org"]).await;
    let uri = format!("/api/v1/register/{}", codes[0]);

    for body in [
        // Prefers phone but gave none.
        serde_json::json!({
            "first_name": "Ann", "last_name": "Tester",
            "email": "ann@example.org", "preferred_channel": "phone",
        }),
        serde_json::json!({
            "first_name": "Ann", "last_name": "Tester",
            "phone": "12", "preferred_channel": "phone",
        }),
        serde_json::json!({
            "first_name": " ", "last_name": "Tester",
            "email": "ann@example.org", "preferred_channel": "email",
        }),
    ] {
        let response = post_json(common::build_test_app(pool.clone()), &uri, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn manager_keys_in_emailed_registration(pool: PgPool) {
    let manager = token_for(&pool, "pm", ROLE_PROJECT_MANAGER).await;
    let assembly = create_assembly_in(&pool, "Housing", AssemblyStatus::RegistrationOpen).await;
    let (_, codes) = create_email_batch(&pool, &manager, assembly, &["a@example.org"]).await;

    let body = serde_json::json!({
        "invite_code": codes[0],
        "first_name": "Bob",
        "last_name": "Replier",
        "phone": "+44 7700 900123",
        "preferred_channel": "phone",
    });
    let response = post_json_auth(common::build_test_app(pool), "/api/v1/registrants", body, &manager).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["source"], "email");
    assert_eq!(json["phone"], "+447700900123");
    assert_eq!(json["assembly_id"], assembly);
}

// ---------------------------------------------------------------------------
// Registrant management
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_filters_and_withdraw(pool: PgPool) {
    let manager = token_for(&pool, "pm", ROLE_PROJECT_MANAGER).await;
    let assembly = create_assembly_in(&pool, "Housing", AssemblyStatus::RegistrationOpen).await;
    let (_, codes) = create_email_batch(&pool, &manager, assembly, &["a@example.org", "b@example.org"]).await;
    let ann = register(&pool, &codes[0], registration_body("Ann", "ann@example.org")).await;
    register(&pool, &codes[1], registration_body("Bea", "bea@example.org")).await;

    let uri = format!("/api/v1/registrants/{ann}/withdraw");
    let response = post_json_auth(common::build_test_app(pool.clone()), &uri, serde_json::json!({}), &manager).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["withdrawn_at"].is_string());

    let response = post_json_auth(common::build_test_app(pool.clone()), &uri, serde_json::json!({}), &manager).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = get_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/assemblies/{assembly}/registrants?registration=registered"),
        &manager,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["first_name"], "Bea");

    let response = get_auth(
        common::build_test_app(pool),
        &format!("/api/v1/assemblies/{assembly}/registrants?selection=chosen"),
        &manager,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
