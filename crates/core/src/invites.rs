//! Invite batch rules: channels, codes, recipients, and QR payloads.

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::error::CoreError;
use crate::tokens::{is_alphabet_code, normalize_code, random_code};

/// Length of an invite code.
pub const INVITE_CODE_LENGTH: usize = 8;

/// Maximum recipients accepted in a single batch request.
pub const MAX_BATCH_SIZE: usize = 10_000;

/// How the invites of a batch reach their recipients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteChannel {
    /// Bulk email with a registration link.
    Email,
    /// Printed letter with a QR code, mailed by the fulfillment service.
    Post,
}

impl InviteChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            InviteChannel::Email => "email",
            InviteChannel::Post => "post",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "email" => Ok(InviteChannel::Email),
            "post" => Ok(InviteChannel::Post),
            other => Err(CoreError::Validation(format!(
                "Invalid invite channel '{other}'. Must be one of: email, post"
            ))),
        }
    }
}

/// Generate a fresh invite code.
pub fn generate_invite_code() -> String {
    random_code(INVITE_CODE_LENGTH)
}

/// Normalize and validate a code typed or scanned by a registrant.
pub fn parse_invite_code(input: &str) -> Result<String, CoreError> {
    let code = normalize_code(input);
    if is_alphabet_code(&code, INVITE_CODE_LENGTH) {
        Ok(code)
    } else {
        Err(CoreError::Validation(format!("'{input}' is not a valid invite code")))
    }
}

/// The URL encoded in an invite's QR code.
pub fn registration_url(public_base_url: &str, code: &str) -> String {
    format!("{}/register/{code}", public_base_url.trim_end_matches('/'))
}

/// Validate the recipient list for a new batch.
///
/// Email batches need a plausible address per line; postal batches need a
/// non-empty address block.
pub fn validate_recipients(channel: InviteChannel, recipients: &[String]) -> Result<(), CoreError> {
    if recipients.is_empty() {
        return Err(CoreError::Validation(
            "An invite batch needs at least one recipient".to_string(),
        ));
    }
    if recipients.len() > MAX_BATCH_SIZE {
        return Err(CoreError::Validation(format!(
            "An invite batch may contain at most {MAX_BATCH_SIZE} recipients"
        )));
    }
    for (idx, recipient) in recipients.iter().enumerate() {
        let recipient = recipient.trim();
        let valid = match channel {
            InviteChannel::Email => recipient.validate_email(),
            InviteChannel::Post => !recipient.is_empty(),
        };
        if !valid {
            return Err(CoreError::Validation(format!(
                "Recipient #{} is not a valid {} address",
                idx + 1,
                channel.as_str()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_parse() {
        let code = generate_invite_code();
        assert_eq!(parse_invite_code(&code.to_lowercase()).unwrap(), code);
    }

    #[test]
    fn bad_codes_rejected() {
        assert!(parse_invite_code("SHORT").is_err());
        assert!(parse_invite_code("ABCDEFG0").is_err());
    }

    #[test]
    fn registration_url_trims_trailing_slash() {
        assert_eq!(
            registration_url("https://dlp.example.org/", "ABCD2345"),
            "https://dlp.example.org/register/ABCD2345"
        );
    }

    #[test]
    fn email_recipients_validated() {
        let ok = vec!["a@example.org".to_string(), " b@example.org ".to_string()];
        assert!(validate_recipients(InviteChannel::Email, &ok).is_ok());

        let bad = vec!["a@example.org".to_string(), "not-an-email".to_string()];
        let err = validate_recipients(InviteChannel::Email, &bad).unwrap_err();
        assert!(err.to_string().contains("#2"));
    }

    #[test]
    fn postal_recipients_need_text() {
        let ok = vec!["1 High Street\nTown".to_string()];
        assert!(validate_recipients(InviteChannel::Post, &ok).is_ok());
        assert!(validate_recipients(InviteChannel::Post, &["  ".to_string()]).is_err());
        assert!(validate_recipients(InviteChannel::Post, &[]).is_err());
    }

    #[test]
    fn channel_parse() {
        assert_eq!(InviteChannel::parse("post").unwrap(), InviteChannel::Post);
        assert!(InviteChannel::parse("fax").is_err());
    }
}
