//! Repository for the `refresh_sessions` table.

use opendlp_core::types::DbId;
use sqlx::PgPool;

use crate::models::refresh_session::{NewRefreshSession, RefreshSession};

const COLUMNS: &str = "id, user_id, token_hash, expires_at, revoked_at, replaced_by, \
                        created_at, updated_at";

/// Issue, rotate and revoke refresh tokens.
pub struct RefreshSessionRepo;

impl RefreshSessionRepo {
    /// Record a freshly issued refresh token at login.
    pub async fn issue(
        pool: &PgPool,
        input: &NewRefreshSession,
    ) -> Result<RefreshSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO refresh_sessions (user_id, token_hash, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RefreshSession>(&query)
            .bind(input.user_id)
            .bind(&input.token_hash)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// The unrevoked, unexpired session holding `token_hash`.
    pub async fn find_usable(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<RefreshSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM refresh_sessions
             WHERE token_hash = $1
               AND revoked_at IS NULL
               AND expires_at > NOW()"
        );
        sqlx::query_as::<_, RefreshSession>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Revoke session `id` and issue `next` in its place, atomically.
    ///
    /// Returns `None` when `id` is no longer usable, e.g. a concurrent
    /// refresh already rotated it. Nothing is written in that case.
    pub async fn rotate(
        pool: &PgPool,
        id: DbId,
        next: &NewRefreshSession,
    ) -> Result<Option<RefreshSession>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let claimed: Option<(DbId,)> = sqlx::query_as(
            "UPDATE refresh_sessions SET revoked_at = NOW()
             WHERE id = $1 AND user_id = $2 AND revoked_at IS NULL AND expires_at > NOW()
             RETURNING id",
        )
        .bind(id)
        .bind(next.user_id)
        .fetch_optional(&mut *tx)
        .await?;
        if claimed.is_none() {
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO refresh_sessions (user_id, token_hash, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let issued = sqlx::query_as::<_, RefreshSession>(&query)
            .bind(next.user_id)
            .bind(&next.token_hash)
            .bind(next.expires_at)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE refresh_sessions SET replaced_by = $2 WHERE id = $1")
            .bind(id)
            .bind(issued.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(issued))
    }

    /// Revoke every live session of a user.
    ///
    /// Used on logout, deactivation and password reset.
    pub async fn revoke_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE refresh_sessions SET revoked_at = NOW()
             WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete sessions that can no longer be redeemed.
    pub async fn purge_stale(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM refresh_sessions WHERE expires_at < NOW() OR revoked_at IS NOT NULL",
        )
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
