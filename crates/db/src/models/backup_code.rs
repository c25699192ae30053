//! Two-factor backup code rows.

use sqlx::FromRow;
use opendlp_core::types::{DbId, Timestamp};

/// A hashed backup code from `user_backup_codes`. `used_at` is set once consumed.
#[derive(Debug, Clone, FromRow)]
pub struct BackupCode {
    pub id: DbId,
    pub user_id: DbId,
    pub code_hash: String,
    pub used_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
