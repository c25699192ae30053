//! Repository for the `registrants` table.

use sqlx::PgPool;
use opendlp_core::status::{InviteStatus, RegistrationStatus, SelectionStatus};
use opendlp_core::types::DbId;

use crate::models::registrant::{CreateRegistrant, Registrant, RegistrantFilter};

const COLUMNS: &str = "id, assembly_id, invite_id, first_name, last_name, email, phone, \
                        postal_address, preferred_channel, attributes, needs, source, \
                        registration_status_id, selection_status_id, confirmation_status_id, \
                        withdrawn_at, created_at, updated_at";

/// Provides registration, listing, and status operations for registrants.
pub struct RegistrantRepo;

impl RegistrantRepo {
    /// Register against an invite and mark the invite as responded.
    ///
    /// The registrant inherits the invite's assembly. A second registration
    /// for the same invite violates `uq_registrants_invite_id`.
    pub async fn create(
        pool: &PgPool,
        input: &CreateRegistrant,
    ) -> Result<Registrant, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO registrants
                (assembly_id, invite_id, first_name, last_name, email, phone, postal_address,
                 preferred_channel, attributes, needs, source)
             SELECT i.assembly_id, i.id, $2, $3, $4, $5, $6, $7, $8, $9, $10
             FROM invites i
             WHERE i.id = $1
             RETURNING {COLUMNS}"
        );
        let registrant = sqlx::query_as::<_, Registrant>(&query)
            .bind(input.invite_id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.postal_address)
            .bind(&input.preferred_channel)
            .bind(&input.attributes)
            .bind(&input.needs)
            .bind(&input.source)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE invites SET status_id = $2, responded_at = NOW() WHERE id = $1")
            .bind(input.invite_id)
            .bind(InviteStatus::Responded.id())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(registrant)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Registrant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM registrants WHERE id = $1");
        sqlx::query_as::<_, Registrant>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_invite(
        pool: &PgPool,
        invite_id: DbId,
    ) -> Result<Option<Registrant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM registrants WHERE invite_id = $1");
        sqlx::query_as::<_, Registrant>(&query)
            .bind(invite_id)
            .fetch_optional(pool)
            .await
    }

    /// List an assembly's registrants in registration order.
    pub async fn list_by_assembly(
        pool: &PgPool,
        assembly_id: DbId,
        filter: RegistrantFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Registrant>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM registrants
             WHERE assembly_id = $1
               AND ($2::SMALLINT IS NULL OR registration_status_id = $2)
               AND ($3::SMALLINT IS NULL OR selection_status_id = $3)
               AND ($4::SMALLINT IS NULL OR confirmation_status_id = $4)
             ORDER BY id
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, Registrant>(&query)
            .bind(assembly_id)
            .bind(filter.registration_status_id)
            .bind(filter.selection_status_id)
            .bind(filter.confirmation_status_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Registrants eligible for the next selection run, ordered by id.
    pub async fn selectable_pool(
        pool: &PgPool,
        assembly_id: DbId,
    ) -> Result<Vec<Registrant>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM registrants
             WHERE assembly_id = $1
               AND registration_status_id = $2
               AND selection_status_id = $3
             ORDER BY id"
        );
        sqlx::query_as::<_, Registrant>(&query)
            .bind(assembly_id)
            .bind(RegistrationStatus::Registered.id())
            .bind(SelectionStatus::Pool.id())
            .fetch_all(pool)
            .await
    }

    /// Selected, still-registered registrants for confirmation callers.
    ///
    /// Unconfirmed and attempted registrants come first.
    pub async fn call_list(
        pool: &PgPool,
        assembly_id: DbId,
    ) -> Result<Vec<Registrant>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM registrants
             WHERE assembly_id = $1
               AND registration_status_id = $2
               AND selection_status_id = $3
             ORDER BY confirmation_status_id, id"
        );
        sqlx::query_as::<_, Registrant>(&query)
            .bind(assembly_id)
            .bind(RegistrationStatus::Registered.id())
            .bind(SelectionStatus::Selected.id())
            .fetch_all(pool)
            .await
    }

    /// Withdraw a registrant. Returns `None` if already withdrawn or missing.
    pub async fn withdraw(pool: &PgPool, id: DbId) -> Result<Option<Registrant>, sqlx::Error> {
        let query = format!(
            "UPDATE registrants SET registration_status_id = $3, withdrawn_at = NOW()
             WHERE id = $1 AND registration_status_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Registrant>(&query)
            .bind(id)
            .bind(RegistrationStatus::Registered.id())
            .bind(RegistrationStatus::Withdrawn.id())
            .fetch_optional(pool)
            .await
    }
}
