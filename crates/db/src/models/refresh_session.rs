//! Refresh-token sessions.

use opendlp_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// One issued refresh token. Only the SHA-256 hash of the token is stored.
///
/// A rotated session has `revoked_at` set and `replaced_by` pointing at the
/// session issued in its place.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshSession {
    pub id: DbId,
    pub user_id: DbId,
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    pub replaced_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RefreshSession {
    pub fn is_usable_at(&self, now: Timestamp) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

pub struct NewRefreshSession {
    pub user_id: DbId,
    pub token_hash: String,
    pub expires_at: Timestamp,
}
