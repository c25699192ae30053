//! Repository for `confirmation_records`.

use sqlx::PgPool;
use opendlp_core::types::DbId;

use crate::models::confirmation::{ConfirmationRecord, CreateConfirmationRecord};

const COLUMNS: &str = "id, registrant_id, caller_id, outcome, notes, needs, created_at, updated_at";

/// Append-only confirmation call log.
pub struct ConfirmationRepo;

impl ConfirmationRepo {
    /// Log a call and apply its effect on the registrant in one transaction.
    ///
    /// Supplied needs overwrite the registrant's needs; absent needs leave them.
    pub async fn record(
        pool: &PgPool,
        input: &CreateConfirmationRecord,
    ) -> Result<ConfirmationRecord, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO confirmation_records (registrant_id, caller_id, outcome, notes, needs)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        let record = sqlx::query_as::<_, ConfirmationRecord>(&query)
            .bind(input.registrant_id)
            .bind(input.caller_id)
            .bind(&input.outcome)
            .bind(&input.notes)
            .bind(&input.needs)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE registrants SET
                confirmation_status_id = $2,
                needs = COALESCE($3, needs)
             WHERE id = $1",
        )
        .bind(input.registrant_id)
        .bind(input.resulting_status_id)
        .bind(&input.needs)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(record)
    }

    /// A registrant's call history, oldest first.
    pub async fn list_by_registrant(
        pool: &PgPool,
        registrant_id: DbId,
    ) -> Result<Vec<ConfirmationRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM confirmation_records
             WHERE registrant_id = $1
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, ConfirmationRecord>(&query)
            .bind(registrant_id)
            .fetch_all(pool)
            .await
    }
}
