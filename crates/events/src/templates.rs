//! Wording for invitations and selection notices.

use crate::delivery::OutboundMessage;

/// Email invitation carrying the registration link and code.
pub fn invite_email(
    assembly_name: &str,
    recipient: &str,
    registration_url: &str,
    code: &str,
) -> OutboundMessage {
    OutboundMessage {
        to: recipient.to_string(),
        subject: format!("You are invited to take part in {assembly_name}"),
        body: format!(
            "You have been chosen at random to be invited to {assembly_name}.\n\n\
             To register your interest, visit:\n{registration_url}\n\n\
             If asked, your invitation code is {code}.\n\
             You can also reply to this email or phone us and quote the code."
        ),
        reference: Some(code.to_string()),
    }
}

/// Printed letter for a postal invitation.
///
/// The letter carries the registration URL; the print service renders it
/// as a QR code next to the text.
pub fn invite_letter(
    assembly_name: &str,
    postal_address: &str,
    registration_url: &str,
    code: &str,
) -> OutboundMessage {
    OutboundMessage {
        to: postal_address.to_string(),
        subject: format!("Invitation: {assembly_name}"),
        body: format!(
            "Dear resident,\n\n\
             Your household has been chosen at random to receive an invitation to \
             {assembly_name}.\n\n\
             Scan the QR code or visit {registration_url} to register.\n\
             Your invitation code is {code}. You can also register by phone."
        ),
        reference: Some(code.to_string()),
    }
}

/// Notice sent to a registrant drawn by a selection run.
pub fn selection_notice(assembly_name: &str, registrant_name: &str, to: &str) -> OutboundMessage {
    OutboundMessage {
        to: to.to_string(),
        subject: format!("You have been selected for {assembly_name}"),
        body: format!(
            "Dear {registrant_name},\n\n\
             Thank you for registering. You have been selected to take part in \
             {assembly_name}. A member of our team will phone you shortly to confirm \
             your place and any support you need to attend."
        ),
        reference: None,
    }
}
