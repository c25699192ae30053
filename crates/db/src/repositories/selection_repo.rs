//! Repository for `selection_runs` and `selection_run_members`.

use sqlx::PgPool;
use opendlp_core::status::{RegistrationStatus, SelectionStatus};
use opendlp_core::types::DbId;

use crate::models::selection::{CreateSelectionRun, SelectionRun, SelectionRunMember};

const RUN_COLUMNS: &str = "id, assembly_id, seed, target_count, pool_size, selected_count, \
                            stratification, run_by, created_at, updated_at";

const MEMBER_COLUMNS: &str = "id, selection_run_id, registrant_id, rank, created_at, updated_at";

/// Persists selection runs.
pub struct SelectionRunRepo;

impl SelectionRunRepo {
    /// Persist a run and move its members from `pool` to `selected`.
    ///
    /// `selected` is in rank order. Returns `None` (and writes nothing) if
    /// any member left the pool since it was read, e.g. by withdrawing.
    pub async fn create_with_members(
        pool: &PgPool,
        input: &CreateSelectionRun,
        selected: &[DbId],
    ) -> Result<Option<SelectionRun>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let moved = sqlx::query(
            "UPDATE registrants SET selection_status_id = $4
             WHERE id = ANY($1)
               AND assembly_id = $5
               AND registration_status_id = $2
               AND selection_status_id = $3",
        )
        .bind(selected)
        .bind(RegistrationStatus::Registered.id())
        .bind(SelectionStatus::Pool.id())
        .bind(SelectionStatus::Selected.id())
        .bind(input.assembly_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if moved != selected.len() as u64 {
            tx.rollback().await?;
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO selection_runs
                (assembly_id, seed, target_count, pool_size, selected_count, stratification, run_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {RUN_COLUMNS}"
        );
        let run = sqlx::query_as::<_, SelectionRun>(&query)
            .bind(input.assembly_id)
            .bind(input.seed)
            .bind(input.target_count)
            .bind(input.pool_size)
            .bind(selected.len() as i32)
            .bind(&input.stratification)
            .bind(input.run_by)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO selection_run_members (selection_run_id, registrant_id, rank)
             SELECT $1, registrant_id, ord::INTEGER
             FROM UNNEST($2::BIGINT[]) WITH ORDINALITY AS t(registrant_id, ord)",
        )
        .bind(run.id)
        .bind(selected)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(run))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SelectionRun>, sqlx::Error> {
        let query = format!("SELECT {RUN_COLUMNS} FROM selection_runs WHERE id = $1");
        sqlx::query_as::<_, SelectionRun>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_assembly(
        pool: &PgPool,
        assembly_id: DbId,
    ) -> Result<Vec<SelectionRun>, sqlx::Error> {
        let query = format!(
            "SELECT {RUN_COLUMNS} FROM selection_runs
             WHERE assembly_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, SelectionRun>(&query)
            .bind(assembly_id)
            .fetch_all(pool)
            .await
    }

    /// Members of a run in rank order.
    pub async fn list_members(
        pool: &PgPool,
        run_id: DbId,
    ) -> Result<Vec<SelectionRunMember>, sqlx::Error> {
        let query = format!(
            "SELECT {MEMBER_COLUMNS} FROM selection_run_members
             WHERE selection_run_id = $1
             ORDER BY rank"
        );
        sqlx::query_as::<_, SelectionRunMember>(&query)
            .bind(run_id)
            .fetch_all(pool)
            .await
    }
}
