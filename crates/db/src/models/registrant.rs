//! Registrant model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use opendlp_core::status::{RegistrationStatus, SelectionStatus, StatusId};
use opendlp_core::types::{DbId, Timestamp};

/// A row from the `registrants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Registrant {
    pub id: DbId,
    pub assembly_id: DbId,
    pub invite_id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub postal_address: Option<String>,
    pub preferred_channel: String,
    /// Flat string map of demographic attributes.
    pub attributes: serde_json::Value,
    pub needs: Option<String>,
    pub source: String,
    pub registration_status_id: StatusId,
    pub selection_status_id: StatusId,
    pub confirmation_status_id: StatusId,
    pub withdrawn_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Registrant {
    pub fn registration_status(&self) -> Option<RegistrationStatus> {
        RegistrationStatus::from_id(self.registration_status_id)
    }

    pub fn selection_status(&self) -> Option<SelectionStatus> {
        SelectionStatus::from_id(self.selection_status_id)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// DTO for recording a registration against an invite.
#[derive(Debug, Clone)]
pub struct CreateRegistrant {
    pub invite_id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub postal_address: Option<String>,
    pub preferred_channel: String,
    pub attributes: serde_json::Value,
    pub needs: Option<String>,
    pub source: String,
}

/// Optional filters for listing an assembly's registrants.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistrantFilter {
    pub registration_status_id: Option<StatusId>,
    pub selection_status_id: Option<StatusId>,
    pub confirmation_status_id: Option<StatusId>,
}
