//! Integration tests for refresh-session rotation and two-factor teardown.

use chrono::{Duration, Utc};
use opendlp_core::roles::ROLE_PROJECT_MANAGER;
use opendlp_db::models::refresh_session::NewRefreshSession;
use opendlp_db::models::user::CreateUser;
use opendlp_db::repositories::{BackupCodeRepo, RefreshSessionRepo, RoleRepo, UserRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_user(pool: &PgPool, username: &str) -> i64 {
    let role = RoleRepo::find_by_name(pool, ROLE_PROJECT_MANAGER)
        .await
        .unwrap()
        .expect("seeded role");
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@example.org"),
            password_hash: "not-a-real-hash".to_string(),
            role_id: role.id,
        },
    )
    .await
    .unwrap()
    .id
}

fn token(user_id: i64, hash: &str) -> NewRefreshSession {
    NewRefreshSession {
        user_id,
        token_hash: hash.to_string(),
        expires_at: Utc::now() + Duration::days(7),
    }
}

// ---------------------------------------------------------------------------
// Refresh sessions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn rotation_links_and_retires_the_old_session(pool: PgPool) {
    let user_id = seed_user(&pool, "rotator").await;
    let first = RefreshSessionRepo::issue(&pool, &token(user_id, "hash-1"))
        .await
        .unwrap();
    assert!(first.is_usable_at(Utc::now()));

    let second = RefreshSessionRepo::rotate(&pool, first.id, &token(user_id, "hash-2"))
        .await
        .unwrap()
        .expect("first rotation succeeds");

    assert!(RefreshSessionRepo::find_usable(&pool, "hash-1")
        .await
        .unwrap()
        .is_none());
    let found = RefreshSessionRepo::find_usable(&pool, "hash-2")
        .await
        .unwrap()
        .expect("successor is usable");
    assert_eq!(found.id, second.id);

    let (replaced_by,): (Option<i64>,) =
        sqlx::query_as("SELECT replaced_by FROM refresh_sessions WHERE id = $1")
            .bind(first.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(replaced_by, Some(second.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn a_rotated_session_cannot_rotate_again(pool: PgPool) {
    let user_id = seed_user(&pool, "replayer").await;
    let first = RefreshSessionRepo::issue(&pool, &token(user_id, "hash-a"))
        .await
        .unwrap();

    RefreshSessionRepo::rotate(&pool, first.id, &token(user_id, "hash-b"))
        .await
        .unwrap()
        .expect("first rotation succeeds");
    let replay = RefreshSessionRepo::rotate(&pool, first.id, &token(user_id, "hash-c"))
        .await
        .unwrap();
    assert!(replay.is_none());

    // The losing rotation wrote nothing.
    assert!(RefreshSessionRepo::find_usable(&pool, "hash-c")
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn revoking_a_user_leaves_other_users_alone(pool: PgPool) {
    let alice = seed_user(&pool, "alice").await;
    let bob = seed_user(&pool, "bob").await;
    RefreshSessionRepo::issue(&pool, &token(alice, "alice-1")).await.unwrap();
    RefreshSessionRepo::issue(&pool, &token(alice, "alice-2")).await.unwrap();
    RefreshSessionRepo::issue(&pool, &token(bob, "bob-1")).await.unwrap();

    assert_eq!(RefreshSessionRepo::revoke_for_user(&pool, alice).await.unwrap(), 2);
    assert!(RefreshSessionRepo::find_usable(&pool, "alice-1")
        .await
        .unwrap()
        .is_none());
    assert!(RefreshSessionRepo::find_usable(&pool, "bob-1")
        .await
        .unwrap()
        .is_some());

    assert_eq!(RefreshSessionRepo::purge_stale(&pool).await.unwrap(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn expired_sessions_are_not_usable(pool: PgPool) {
    let user_id = seed_user(&pool, "sleeper").await;
    let stale = NewRefreshSession {
        expires_at: Utc::now() - Duration::minutes(1),
        ..token(user_id, "hash-old")
    };
    let session = RefreshSessionRepo::issue(&pool, &stale).await.unwrap();

    assert!(!session.is_usable_at(Utc::now()));
    assert!(RefreshSessionRepo::find_usable(&pool, "hash-old")
        .await
        .unwrap()
        .is_none());
    assert!(RefreshSessionRepo::rotate(&pool, session.id, &token(user_id, "hash-new"))
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Two-factor
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn disabling_totp_clears_secret_and_backup_codes(pool: PgPool) {
    let user_id = seed_user(&pool, "twofactor").await;
    UserRepo::set_totp_secret(&pool, user_id, "sealed-secret").await.unwrap();
    assert!(UserRepo::enable_totp(&pool, user_id).await.unwrap());
    let hashes: Vec<String> = (0..10).map(|i| format!("code-hash-{i}")).collect();
    BackupCodeRepo::replace_for_user(&pool, user_id, &hashes).await.unwrap();

    UserRepo::disable_totp(&pool, user_id).await.unwrap();

    let user = UserRepo::find_by_id(&pool, user_id).await.unwrap().unwrap();
    assert!(!user.totp_enabled);
    assert!(user.totp_secret_encrypted.is_none());
    assert_eq!(BackupCodeRepo::count_unused(&pool, user_id).await.unwrap(), 0);
}
