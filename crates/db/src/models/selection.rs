//! Selection run models.

use serde::Serialize;
use sqlx::FromRow;
use opendlp_core::types::{DbId, Timestamp};

/// A row from the `selection_runs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SelectionRun {
    pub id: DbId,
    pub assembly_id: DbId,
    /// Replaying the run with this seed over the same pool reproduces it.
    pub seed: i64,
    pub target_count: i32,
    pub pool_size: i32,
    pub selected_count: i32,
    pub stratification: Option<serde_json::Value>,
    pub run_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for persisting a completed run.
#[derive(Debug, Clone)]
pub struct CreateSelectionRun {
    pub assembly_id: DbId,
    pub seed: i64,
    pub target_count: i32,
    pub pool_size: i32,
    pub stratification: Option<serde_json::Value>,
    pub run_by: Option<DbId>,
}

/// A registrant drawn by a run, with its rank (1-based).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SelectionRunMember {
    pub id: DbId,
    pub selection_run_id: DbId,
    pub registrant_id: DbId,
    pub rank: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
