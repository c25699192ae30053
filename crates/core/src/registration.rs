//! Registrant contact rules and registration sources.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::error::CoreError;
use crate::status::{RegistrationStatus, SelectionStatus};

/// Maximum number of demographic attributes stored per registrant.
pub const MAX_ATTRIBUTES: usize = 32;

/// Phone numbers after separators are removed: optional `+`, 8-15 digits.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{8,15}$").expect("valid regex"));

/// The channel a registrant prefers to be contacted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactChannel {
    Email,
    Phone,
    Post,
}

impl ContactChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            ContactChannel::Email => "email",
            ContactChannel::Phone => "phone",
            ContactChannel::Post => "post",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "email" => Ok(ContactChannel::Email),
            "phone" => Ok(ContactChannel::Phone),
            "post" => Ok(ContactChannel::Post),
            other => Err(CoreError::Validation(format!(
                "Invalid contact channel '{other}'. Must be one of: email, phone, post"
            ))),
        }
    }
}

/// How a registration reached the back end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationSource {
    /// Registrant used the link or QR code on their invite.
    Web,
    /// Registrant replied by email and a manager keyed the response in.
    Email,
    /// Registrant phoned and Pocket Receptionist registered on their behalf.
    Phone,
}

impl RegistrationSource {
    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationSource::Web => "web",
            RegistrationSource::Email => "email",
            RegistrationSource::Phone => "phone",
        }
    }
}

/// Contact details supplied with a registration.
#[derive(Debug, Clone, Default)]
pub struct ContactDetails<'a> {
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub postal_address: Option<&'a str>,
}

/// Strip separators from a phone number and check its shape.
pub fn normalize_phone(input: &str) -> Result<String, CoreError> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')' | '.'))
        .collect();
    if PHONE_RE.is_match(&compact) {
        Ok(compact)
    } else {
        Err(CoreError::Validation(format!(
            "'{input}' is not a valid phone number"
        )))
    }
}

/// Validate contact details against the preferred channel.
///
/// Every supplied value must be well-formed, and the preferred channel must
/// have a value to contact.
pub fn validate_contact(
    preferred: ContactChannel,
    details: &ContactDetails<'_>,
) -> Result<(), CoreError> {
    let email = details.email.map(str::trim).filter(|s| !s.is_empty());
    let phone = details.phone.map(str::trim).filter(|s| !s.is_empty());
    let postal = details
        .postal_address
        .map(str::trim)
        .filter(|s| !s.is_empty());

    if let Some(email) = email {
        if !email.validate_email() {
            return Err(CoreError::Validation(format!(
                "'{email}' is not a valid email address"
            )));
        }
    }
    if let Some(phone) = phone {
        normalize_phone(phone)?;
    }

    let reachable = match preferred {
        ContactChannel::Email => email.is_some(),
        ContactChannel::Phone => phone.is_some(),
        ContactChannel::Post => postal.is_some(),
    };
    if !reachable {
        return Err(CoreError::Validation(format!(
            "Preferred contact channel '{}' requires a matching contact detail",
            preferred.as_str()
        )));
    }
    Ok(())
}

/// Validate the demographic attribute map used for stratified selection.
pub fn validate_attributes(attributes: &BTreeMap<String, String>) -> Result<(), CoreError> {
    if attributes.len() > MAX_ATTRIBUTES {
        return Err(CoreError::Validation(format!(
            "At most {MAX_ATTRIBUTES} attributes may be recorded"
        )));
    }
    if let Some(key) = attributes.keys().find(|k| k.trim().is_empty()) {
        return Err(CoreError::Validation(format!(
            "Attribute names must not be blank (got '{key}')"
        )));
    }
    Ok(())
}

/// A registrant may withdraw once; selected registrants may still withdraw.
pub fn ensure_can_withdraw(status: RegistrationStatus) -> Result<(), CoreError> {
    match status {
        RegistrationStatus::Registered => Ok(()),
        RegistrationStatus::Withdrawn => Err(CoreError::Conflict(
            "Registrant has already withdrawn".to_string(),
        )),
    }
}

/// Whether a registrant is eligible for the next selection run.
pub fn is_selectable(registration: RegistrationStatus, selection: SelectionStatus) -> bool {
    registration == RegistrationStatus::Registered && selection == SelectionStatus::Pool
}
