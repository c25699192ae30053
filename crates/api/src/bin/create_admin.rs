//! Bootstrap an administrator account.
//!
//! ```text
//! create-admin <username> <email> <password>
//! ```
//!
//! Missing arguments fall back to `ADMIN_USERNAME`, `ADMIN_EMAIL` and
//! `ADMIN_PASSWORD`. `DATABASE_URL` must be set.

use anyhow::{bail, Context};
use opendlp_core::roles::ROLE_ADMIN;
use opendlp_db::models::user::CreateUser;
use opendlp_db::repositories::{RoleRepo, UserRepo};

use opendlp_api::auth::password::{hash_password, validate_password_strength};
use opendlp_api::config::DEFAULT_MIN_PASSWORD_LENGTH;

fn arg_or_env(args: &mut impl Iterator<Item = String>, var: &str) -> anyhow::Result<String> {
    args.next()
        .or_else(|| std::env::var(var).ok())
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("missing argument (or {var})"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "create_admin=info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let username = arg_or_env(&mut args, "ADMIN_USERNAME")?;
    let email = arg_or_env(&mut args, "ADMIN_EMAIL")?;
    let password = arg_or_env(&mut args, "ADMIN_PASSWORD")?;

    let min_length = std::env::var("MIN_PASSWORD_LENGTH")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MIN_PASSWORD_LENGTH);
    validate_password_strength(&password, min_length).map_err(anyhow::Error::msg)?;

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = opendlp_db::create_pool(&database_url)
        .await
        .context("failed to connect to database")?;
    opendlp_db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    if UserRepo::find_by_username(&pool, &username).await?.is_some() {
        bail!("user '{username}' already exists");
    }

    let role = RoleRepo::find_by_name(&pool, ROLE_ADMIN)
        .await?
        .context("admin role is not seeded")?;

    let password_hash =
        hash_password(&password).map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;

    let user = UserRepo::create(
        &pool,
        &CreateUser {
            username,
            email: email.trim().to_lowercase(),
            password_hash,
            role_id: role.id,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, username = %user.username, "Administrator created");
    Ok(())
}
