//! Assembly lifecycle rules.
//!
//! An assembly moves through specification review, registration, and
//! selection phases. Every status change requested through the API is
//! checked here before it reaches the database.

use chrono::NaiveDate;

use crate::error::CoreError;
use crate::status::AssemblyStatus;

/// Maximum length of an assembly name.
pub const MAX_NAME_LENGTH: usize = 200;

/// Named lifecycle actions exposed as `POST /assemblies/{id}/{action}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyAction {
    /// Project manager submits the specification for client review.
    Submit,
    /// Client approves the specification.
    Approve,
    /// Client sends the specification back to draft.
    RequestChanges,
    OpenRegistration,
    CloseRegistration,
    Complete,
    Archive,
}

impl AssemblyAction {
    /// The status an assembly lands in after this action.
    pub fn target_status(self) -> AssemblyStatus {
        match self {
            AssemblyAction::Submit => AssemblyStatus::InReview,
            AssemblyAction::Approve => AssemblyStatus::Approved,
            AssemblyAction::RequestChanges => AssemblyStatus::Draft,
            AssemblyAction::OpenRegistration => AssemblyStatus::RegistrationOpen,
            AssemblyAction::CloseRegistration => AssemblyStatus::RegistrationClosed,
            AssemblyAction::Complete => AssemblyStatus::Completed,
            AssemblyAction::Archive => AssemblyStatus::Archived,
        }
    }

    /// Whether this action is a client review decision.
    pub fn is_review(self) -> bool {
        matches!(self, AssemblyAction::Approve | AssemblyAction::RequestChanges)
    }
}

/// Return `true` if an assembly may move from `from` to `to`.
pub fn can_transition(from: AssemblyStatus, to: AssemblyStatus) -> bool {
    use AssemblyStatus::*;

    match (from, to) {
        (Archived, _) => false,
        (_, Archived) => true,
        (Draft, InReview)
        | (InReview, Approved)
        | (InReview, Draft)
        | (Approved, RegistrationOpen)
        | (RegistrationOpen, RegistrationClosed)
        | (RegistrationClosed, Completed) => true,
        _ => false,
    }
}

/// Validate a status transition, producing a `Conflict` error when it is not allowed.
pub fn validate_transition(from: AssemblyStatus, to: AssemblyStatus) -> Result<(), CoreError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Assembly cannot move from '{from}' to '{to}'"
        )))
    }
}

/// Only draft assemblies may have their specification edited.
pub fn ensure_editable(status: AssemblyStatus) -> Result<(), CoreError> {
    if status == AssemblyStatus::Draft {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Assembly specification is locked while '{status}'"
        )))
    }
}

/// Invite batches may be created while the assembly is approved or open.
pub fn ensure_accepts_invites(status: AssemblyStatus) -> Result<(), CoreError> {
    match status {
        AssemblyStatus::Approved | AssemblyStatus::RegistrationOpen => Ok(()),
        other => Err(CoreError::Conflict(format!(
            "Invites cannot be created while the assembly is '{other}'"
        ))),
    }
}

/// Registrations are only accepted while registration is open.
pub fn ensure_accepts_registrations(status: AssemblyStatus) -> Result<(), CoreError> {
    if status == AssemblyStatus::RegistrationOpen {
        Ok(())
    } else {
        Err(CoreError::Conflict(
            "Registration for this assembly is not open".to_string(),
        ))
    }
}

/// Selection runs happen after registration closes.
pub fn ensure_accepts_selection(status: AssemblyStatus) -> Result<(), CoreError> {
    if status == AssemblyStatus::RegistrationClosed {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Selection requires a closed registration, assembly is '{status}'"
        )))
    }
}

/// Validate the editable fields of an assembly specification.
///
/// `None` values are skipped so the same check serves create and update.
pub fn validate_spec(
    name: Option<&str>,
    target_size: Option<i32>,
    starts_on: Option<NaiveDate>,
    ends_on: Option<NaiveDate>,
) -> Result<(), CoreError> {
    if let Some(name) = name {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(CoreError::Validation(
                "Assembly name must not be empty".to_string(),
            ));
        }
        if trimmed.chars().count() > MAX_NAME_LENGTH {
            return Err(CoreError::Validation(format!(
                "Assembly name must be at most {MAX_NAME_LENGTH} characters"
            )));
        }
    }
    if let Some(size) = target_size {
        if size <= 0 {
            return Err(CoreError::Validation(
                "target_size must be greater than zero".to_string(),
            ));
        }
    }
    if let (Some(start), Some(end)) = (starts_on, ends_on) {
        if end < start {
            return Err(CoreError::Validation(
                "ends_on must not be before starts_on".to_string(),
            ));
        }
    }
    Ok(())
}
