//! Repository for the `assemblies` table.

use sqlx::PgPool;
use opendlp_core::status::{
    AssemblyStatus, ConfirmationStatus, InviteStatus, RegistrationStatus, SelectionStatus,
    StatusId,
};
use opendlp_core::types::DbId;

use crate::models::assembly::{Assembly, AssemblySummary, CreateAssembly, UpdateAssembly};

const COLUMNS: &str = "id, name, description, location, starts_on, ends_on, target_size, \
                        status_id, review_comment, reviewed_by, reviewed_at, created_by, \
                        created_at, updated_at";

/// Provides CRUD and status operations for assemblies.
pub struct AssemblyRepo;

impl AssemblyRepo {
    /// Insert a new draft assembly.
    pub async fn create(
        pool: &PgPool,
        input: &CreateAssembly,
        created_by: Option<DbId>,
    ) -> Result<Assembly, sqlx::Error> {
        let query = format!(
            "INSERT INTO assemblies
                (name, description, location, starts_on, ends_on, target_size, status_id, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assembly>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.location)
            .bind(input.starts_on)
            .bind(input.ends_on)
            .bind(input.target_size)
            .bind(AssemblyStatus::Draft.id())
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Assembly>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assemblies WHERE id = $1");
        sqlx::query_as::<_, Assembly>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List assemblies newest first, optionally filtered by status.
    pub async fn list(
        pool: &PgPool,
        status_id: Option<StatusId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Assembly>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assemblies
             WHERE ($1::SMALLINT IS NULL OR status_id = $1)
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Assembly>(&query)
            .bind(status_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Patch a draft assembly. Returns `None` if the row is missing or no longer a draft.
    pub async fn update_draft(
        pool: &PgPool,
        id: DbId,
        input: &UpdateAssembly,
    ) -> Result<Option<Assembly>, sqlx::Error> {
        let query = format!(
            "UPDATE assemblies SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                starts_on = COALESCE($5, starts_on),
                ends_on = COALESCE($6, ends_on),
                target_size = COALESCE($7, target_size)
             WHERE id = $1 AND status_id = $8
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assembly>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.location)
            .bind(input.starts_on)
            .bind(input.ends_on)
            .bind(input.target_size)
            .bind(AssemblyStatus::Draft.id())
            .fetch_optional(pool)
            .await
    }

    /// Move an assembly from `from` to `to`.
    ///
    /// Returns `None` when the assembly is no longer in `from`, so two
    /// concurrent transitions cannot both succeed.
    pub async fn transition(
        pool: &PgPool,
        id: DbId,
        from: AssemblyStatus,
        to: AssemblyStatus,
    ) -> Result<Option<Assembly>, sqlx::Error> {
        let query = format!(
            "UPDATE assemblies SET status_id = $3
             WHERE id = $1 AND status_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assembly>(&query)
            .bind(id)
            .bind(from.id())
            .bind(to.id())
            .fetch_optional(pool)
            .await
    }

    /// Like [`transition`](Self::transition), also recording the reviewer and comment.
    pub async fn review(
        pool: &PgPool,
        id: DbId,
        from: AssemblyStatus,
        to: AssemblyStatus,
        reviewer_id: DbId,
        comment: Option<&str>,
    ) -> Result<Option<Assembly>, sqlx::Error> {
        let query = format!(
            "UPDATE assemblies SET
                status_id = $3,
                reviewed_by = $4,
                review_comment = $5,
                reviewed_at = NOW()
             WHERE id = $1 AND status_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assembly>(&query)
            .bind(id)
            .bind(from.id())
            .bind(to.id())
            .bind(reviewer_id)
            .bind(comment)
            .fetch_optional(pool)
            .await
    }

    /// Invite, registration, selection, and confirmation counters.
    pub async fn summary(pool: &PgPool, id: DbId) -> Result<AssemblySummary, sqlx::Error> {
        sqlx::query_as::<_, AssemblySummary>(
            "SELECT
                $1::BIGINT AS assembly_id,
                (SELECT COUNT(*) FROM invites WHERE assembly_id = $1) AS invites_total,
                (SELECT COUNT(*) FROM invites
                  WHERE assembly_id = $1 AND dispatched_at IS NOT NULL) AS invites_dispatched,
                (SELECT COUNT(*) FROM invites
                  WHERE assembly_id = $1 AND status_id = $2) AS invites_responded,
                COUNT(*) FILTER (WHERE r.registration_status_id = $3) AS registered,
                COUNT(*) FILTER (WHERE r.registration_status_id = $4) AS withdrawn,
                COUNT(*) FILTER (WHERE r.registration_status_id = $3
                                   AND r.selection_status_id = $5) AS selected,
                COUNT(*) FILTER (WHERE r.registration_status_id = $3
                                   AND r.confirmation_status_id = $6) AS confirmed,
                COUNT(*) FILTER (WHERE r.confirmation_status_id = $7) AS declined
             FROM registrants r
             WHERE r.assembly_id = $1",
        )
        .bind(id)
        .bind(InviteStatus::Responded.id())
        .bind(RegistrationStatus::Registered.id())
        .bind(RegistrationStatus::Withdrawn.id())
        .bind(SelectionStatus::Selected.id())
        .bind(ConfirmationStatus::Confirmed.id())
        .bind(ConfirmationStatus::Declined.id())
        .fetch_one(pool)
        .await
    }
}
