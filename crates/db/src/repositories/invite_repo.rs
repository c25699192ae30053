//! Repositories for `invite_batches` and `invites`.

use sqlx::PgPool;
use opendlp_core::status::{InviteBatchStatus, InviteStatus};
use opendlp_core::types::DbId;

use crate::models::invite::{CreateInviteBatch, Invite, InviteBatch, NewInvite};

const BATCH_COLUMNS: &str = "id, assembly_id, label, channel, status_id, dispatched_at, \
                              created_by, created_at, updated_at";

const INVITE_COLUMNS: &str = "id, batch_id, assembly_id, code, recipient, status_id, \
                               dispatched_at, responded_at, created_at, updated_at";

/// Invite batch operations.
pub struct InviteBatchRepo;

impl InviteBatchRepo {
    /// Insert a batch together with all of its invites in one transaction.
    ///
    /// A duplicate code trips `uq_invites_code` and rolls the whole batch back.
    pub async fn create_with_invites(
        pool: &PgPool,
        input: &CreateInviteBatch,
        invites: &[NewInvite],
    ) -> Result<(InviteBatch, Vec<Invite>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO invite_batches (assembly_id, label, channel, created_by)
             VALUES ($1, $2, $3, $4)
             RETURNING {BATCH_COLUMNS}"
        );
        let batch = sqlx::query_as::<_, InviteBatch>(&query)
            .bind(input.assembly_id)
            .bind(&input.label)
            .bind(&input.channel)
            .bind(input.created_by)
            .fetch_one(&mut *tx)
            .await?;

        let codes: Vec<&str> = invites.iter().map(|i| i.code.as_str()).collect();
        let recipients: Vec<&str> = invites.iter().map(|i| i.recipient.as_str()).collect();

        let query = format!(
            "INSERT INTO invites (batch_id, assembly_id, code, recipient)
             SELECT $1, $2, code, recipient
             FROM UNNEST($3::text[], $4::text[]) WITH ORDINALITY AS t(code, recipient, ord)
             ORDER BY ord
             RETURNING {INVITE_COLUMNS}"
        );
        let mut created = sqlx::query_as::<_, Invite>(&query)
            .bind(batch.id)
            .bind(batch.assembly_id)
            .bind(&codes)
            .bind(&recipients)
            .fetch_all(&mut *tx)
            .await?;
        created.sort_by_key(|i| i.id);

        tx.commit().await?;
        Ok((batch, created))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<InviteBatch>, sqlx::Error> {
        let query = format!("SELECT {BATCH_COLUMNS} FROM invite_batches WHERE id = $1");
        sqlx::query_as::<_, InviteBatch>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_assembly(
        pool: &PgPool,
        assembly_id: DbId,
    ) -> Result<Vec<InviteBatch>, sqlx::Error> {
        let query = format!(
            "SELECT {BATCH_COLUMNS} FROM invite_batches
             WHERE assembly_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, InviteBatch>(&query)
            .bind(assembly_id)
            .fetch_all(pool)
            .await
    }

    /// Claim a draft batch for dispatch.
    ///
    /// Returns `None` if the batch is missing or was already dispatched.
    pub async fn mark_dispatched(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<InviteBatch>, sqlx::Error> {
        let query = format!(
            "UPDATE invite_batches SET status_id = $3, dispatched_at = NOW()
             WHERE id = $1 AND status_id = $2
             RETURNING {BATCH_COLUMNS}"
        );
        sqlx::query_as::<_, InviteBatch>(&query)
            .bind(id)
            .bind(InviteBatchStatus::Draft.id())
            .bind(InviteBatchStatus::Dispatched.id())
            .fetch_optional(pool)
            .await
    }

    /// Return a claimed batch to draft so its pending invites can be sent again.
    pub async fn release_claim(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE invite_batches SET status_id = $3, dispatched_at = NULL
             WHERE id = $1 AND status_id = $2",
        )
        .bind(id)
        .bind(InviteBatchStatus::Dispatched.id())
        .bind(InviteBatchStatus::Draft.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Individual invite operations.
pub struct InviteRepo;

impl InviteRepo {
    pub async fn list_by_batch(pool: &PgPool, batch_id: DbId) -> Result<Vec<Invite>, sqlx::Error> {
        let query = format!("SELECT {INVITE_COLUMNS} FROM invites WHERE batch_id = $1 ORDER BY id");
        sqlx::query_as::<_, Invite>(&query)
            .bind(batch_id)
            .fetch_all(pool)
            .await
    }

    /// Invites of a batch still waiting to be sent.
    pub async fn list_pending_by_batch(
        pool: &PgPool,
        batch_id: DbId,
    ) -> Result<Vec<Invite>, sqlx::Error> {
        let query = format!(
            "SELECT {INVITE_COLUMNS} FROM invites
             WHERE batch_id = $1 AND status_id = $2
             ORDER BY id"
        );
        sqlx::query_as::<_, Invite>(&query)
            .bind(batch_id)
            .bind(InviteStatus::Pending.id())
            .fetch_all(pool)
            .await
    }

    /// Look up an invite by its normalized code.
    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Invite>, sqlx::Error> {
        let query = format!("SELECT {INVITE_COLUMNS} FROM invites WHERE code = $1");
        sqlx::query_as::<_, Invite>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    /// Mark pending invites as dispatched. Returns the number updated.
    pub async fn mark_dispatched(pool: &PgPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE invites SET status_id = $3, dispatched_at = NOW()
             WHERE id = ANY($1) AND status_id = $2",
        )
        .bind(ids)
        .bind(InviteStatus::Pending.id())
        .bind(InviteStatus::Dispatched.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
