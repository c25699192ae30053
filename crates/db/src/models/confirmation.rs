//! Confirmation call records.

use serde::Serialize;
use sqlx::FromRow;
use opendlp_core::status::StatusId;
use opendlp_core::types::{DbId, Timestamp};

/// A row from the append-only `confirmation_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ConfirmationRecord {
    pub id: DbId,
    pub registrant_id: DbId,
    pub caller_id: Option<DbId>,
    pub outcome: String,
    pub notes: Option<String>,
    pub needs: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for logging a call.
#[derive(Debug, Clone)]
pub struct CreateConfirmationRecord {
    pub registrant_id: DbId,
    pub caller_id: Option<DbId>,
    pub outcome: String,
    pub notes: Option<String>,
    pub needs: Option<String>,
    /// Confirmation status the registrant moves to.
    pub resulting_status_id: StatusId,
}
