//! Assembly entity model, DTOs, and the per-assembly summary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use opendlp_core::status::{AssemblyStatus, StatusId};
use opendlp_core::types::{DbId, Timestamp};

/// A row from the `assemblies` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Assembly {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub target_size: i32,
    pub status_id: StatusId,
    pub review_comment: Option<String>,
    pub reviewed_by: Option<DbId>,
    pub reviewed_at: Option<Timestamp>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Assembly {
    /// Typed status, `None` only if the row holds an unseeded id.
    pub fn status(&self) -> Option<AssemblyStatus> {
        AssemblyStatus::from_id(self.status_id)
    }
}

/// DTO for creating a new assembly. New assemblies start in `draft`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAssembly {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub target_size: i32,
}

/// DTO for editing a draft assembly. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAssembly {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub target_size: Option<i32>,
}

/// Workflow counters for one assembly.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AssemblySummary {
    pub assembly_id: DbId,
    pub invites_total: i64,
    pub invites_dispatched: i64,
    pub invites_responded: i64,
    pub registered: i64,
    pub withdrawn: i64,
    pub selected: i64,
    pub confirmed: i64,
    pub declined: i64,
}
