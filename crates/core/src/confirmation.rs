//! Confirmation call outcomes and their effect on a registrant.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::{ConfirmationStatus, RegistrationStatus, SelectionStatus};

/// Maximum length of free-text call notes and needs.
pub const MAX_NOTE_LENGTH: usize = 4000;

/// What happened on a confirmation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    /// Registrant confirmed they will attend.
    Confirmed,
    /// Registrant will not attend.
    Declined,
    NoAnswer,
    CallbackRequested,
}

impl CallOutcome {
    pub const ALL: &'static [CallOutcome] = &[
        CallOutcome::Confirmed,
        CallOutcome::Declined,
        CallOutcome::NoAnswer,
        CallOutcome::CallbackRequested,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CallOutcome::Confirmed => "confirmed",
            CallOutcome::Declined => "declined",
            CallOutcome::NoAnswer => "no_answer",
            CallOutcome::CallbackRequested => "callback_requested",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        Self::ALL
            .iter()
            .copied()
            .find(|o| o.as_str() == value)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|o| o.as_str()).collect();
                CoreError::Validation(format!(
                    "Invalid call outcome '{value}'. Must be one of: {}",
                    names.join(", ")
                ))
            })
    }

    /// The registrant's confirmation status after a call with this outcome.
    pub fn resulting_status(self) -> ConfirmationStatus {
        match self {
            CallOutcome::Confirmed => ConfirmationStatus::Confirmed,
            CallOutcome::Declined => ConfirmationStatus::Declined,
            CallOutcome::NoAnswer | CallOutcome::CallbackRequested => {
                ConfirmationStatus::Attempted
            }
        }
    }
}

/// A confirmation call can only be logged for a selected, still-registered registrant.
pub fn ensure_callable(
    registration: RegistrationStatus,
    selection: SelectionStatus,
) -> Result<(), CoreError> {
    if registration == RegistrationStatus::Withdrawn {
        return Err(CoreError::Conflict(
            "Registrant has withdrawn and cannot be called".to_string(),
        ));
    }
    if selection != SelectionStatus::Selected {
        return Err(CoreError::Conflict(
            "Only selected registrants can receive confirmation calls".to_string(),
        ));
    }
    Ok(())
}

/// Validate the optional free-text fields of a call record.
pub fn validate_notes(notes: Option<&str>, needs: Option<&str>) -> Result<(), CoreError> {
    for (field, value) in [("notes", notes), ("needs", needs)] {
        if value.is_some_and(|v| v.chars().count() > MAX_NOTE_LENGTH) {
            return Err(CoreError::Validation(format!(
                "{field} must be at most {MAX_NOTE_LENGTH} characters"
            )));
        }
    }
    Ok(())
}
