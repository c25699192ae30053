//! Invite batch and invite models.

use serde::Serialize;
use sqlx::FromRow;
use opendlp_core::status::StatusId;
use opendlp_core::types::{DbId, Timestamp};

/// A row from the `invite_batches` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InviteBatch {
    pub id: DbId,
    pub assembly_id: DbId,
    pub label: String,
    /// `"email"` or `"post"`.
    pub channel: String,
    pub status_id: StatusId,
    pub dispatched_at: Option<Timestamp>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a batch.
#[derive(Debug, Clone)]
pub struct CreateInviteBatch {
    pub assembly_id: DbId,
    pub label: String,
    pub channel: String,
    pub created_by: Option<DbId>,
}

/// A row from the `invites` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Invite {
    pub id: DbId,
    pub batch_id: DbId,
    pub assembly_id: DbId,
    pub code: String,
    /// Email address or postal address, depending on the batch channel.
    pub recipient: String,
    pub status_id: StatusId,
    pub dispatched_at: Option<Timestamp>,
    pub responded_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One invite to generate inside a new batch.
#[derive(Debug, Clone)]
pub struct NewInvite {
    pub code: String,
    pub recipient: String,
}
