//! Repository for `user_backup_codes`.

use sqlx::PgPool;
use opendlp_core::types::DbId;

/// Stores hashed 2FA backup codes.
pub struct BackupCodeRepo;

impl BackupCodeRepo {
    /// Replace a user's whole set of codes in one transaction.
    pub async fn replace_for_user(
        pool: &PgPool,
        user_id: DbId,
        code_hashes: &[String],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM user_backup_codes WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO user_backup_codes (user_id, code_hash)
             SELECT $1, UNNEST($2::text[])",
        )
        .bind(user_id)
        .bind(code_hashes)
        .execute(&mut *tx)
        .await?;

        tx.commit().await
    }

    /// Mark an unused code as used. Returns `false` if no unused code matched.
    pub async fn consume(pool: &PgPool, user_id: DbId, code_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_backup_codes SET used_at = NOW()
             WHERE user_id = $1 AND code_hash = $2 AND used_at IS NULL",
        )
        .bind(user_id)
        .bind(code_hash)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_unused(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_backup_codes WHERE user_id = $1 AND used_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}
