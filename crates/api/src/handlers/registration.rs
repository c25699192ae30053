//! Registration against an invite code.
//!
//! Three entry points share [`register`]: the public link/QR form
//! (`web`), a manager keying in an emailed reply (`email`), and the Pocket
//! Receptionist phone proxy (`phone`, see `integrations`).

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use opendlp_core::assembly::ensure_accepts_registrations;
use opendlp_core::error::CoreError;
use opendlp_core::invites::parse_invite_code;
use opendlp_core::registration::{
    normalize_phone, validate_attributes, validate_contact, ContactChannel, ContactDetails,
    RegistrationSource,
};
use opendlp_core::status::AssemblyStatus;
use opendlp_core::types::DbId;
use opendlp_db::models::invite::Invite;
use opendlp_db::models::registrant::{CreateRegistrant, Registrant};
use opendlp_db::repositories::{InviteRepo, RegistrantRepo};
use opendlp_events::{event_types, PlatformEvent};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::load_assembly;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireManager;
use crate::state::AppState;

/// Longest accepted name part.
const MAX_NAME_LENGTH: usize = 100;

/// Registrant details, as entered on the form or relayed by a proxy.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub postal_address: Option<String>,
    /// `email`, `phone` or `post`.
    pub preferred_channel: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub needs: Option<String>,
}

/// Body of the manager and proxy endpoints, which carry the code in the body.
#[derive(Debug, Deserialize)]
pub struct CodedRegistrationRequest {
    pub invite_code: String,
    #[serde(flatten)]
    pub details: RegistrationRequest,
}

/// What an invite holder sees before registering.
#[derive(Debug, Serialize)]
pub struct InviteLookupResponse {
    pub code: String,
    pub assembly_id: DbId,
    pub assembly_name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub registration_open: bool,
    pub already_registered: bool,
}

/// Returned to the public form; deliberately omits stored personal data.
#[derive(Debug, Serialize)]
pub struct RegistrationReceipt {
    pub registrant_id: DbId,
    pub assembly_name: String,
    pub status: &'static str,
}

/// GET /api/v1/register/{code} (public)
pub async fn lookup_invite(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<InviteLookupResponse>> {
    let invite = find_invite(&state, &code).await?;
    let (assembly, status) = load_assembly(&state.pool, invite.assembly_id).await?;
    let already_registered = RegistrantRepo::find_by_invite(&state.pool, invite.id)
        .await?
        .is_some();

    Ok(Json(InviteLookupResponse {
        code: invite.code,
        assembly_id: assembly.id,
        assembly_name: assembly.name,
        description: assembly.description,
        location: assembly.location,
        starts_on: assembly.starts_on,
        ends_on: assembly.ends_on,
        registration_open: status == AssemblyStatus::RegistrationOpen,
        already_registered,
    }))
}

/// POST /api/v1/register/{code} (public)
pub async fn register_public(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(input): Json<RegistrationRequest>,
) -> AppResult<(StatusCode, Json<RegistrationReceipt>)> {
    let (registrant, assembly_name) =
        register(&state, &code, input, RegistrationSource::Web, None).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegistrationReceipt {
            registrant_id: registrant.id,
            assembly_name,
            status: "registered",
        }),
    ))
}

/// POST /api/v1/registrants
///
/// A manager records a registration that arrived as an email reply.
pub async fn register_keyed_in(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Json(input): Json<CodedRegistrationRequest>,
) -> AppResult<(StatusCode, Json<Registrant>)> {
    let (registrant, _) = register(
        &state,
        &input.invite_code,
        input.details,
        RegistrationSource::Email,
        Some(user.user_id),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(registrant)))
}

/// Validate and store a registration for the invite identified by `code`.
///
/// Returns the registrant and the assembly name.
pub(crate) async fn register(
    state: &AppState,
    code: &str,
    input: RegistrationRequest,
    source: RegistrationSource,
    actor: Option<DbId>,
) -> AppResult<(Registrant, String)> {
    let invite = find_invite(state, code).await?;
    let (assembly, status) = load_assembly(&state.pool, invite.assembly_id).await?;
    ensure_accepts_registrations(status)?;

    if RegistrantRepo::find_by_invite(&state.pool, invite.id)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::Conflict(
            "This invite has already been used to register".into(),
        )));
    }

    let create = build_registrant(invite.id, input, source)?;
    // The unique index on invite_id still catches a concurrent duplicate.
    let registrant = RegistrantRepo::create(&state.pool, &create).await?;

    tracing::info!(
        registrant_id = registrant.id,
        assembly_id = registrant.assembly_id,
        source = source.as_str(),
        "Registrant registered"
    );
    state.event_bus.publish(
        PlatformEvent::new(event_types::REGISTRANT_REGISTERED)
            .with_source("registrant", registrant.id)
            .with_optional_actor(actor)
            .with_payload(json!({
                "assembly_id": registrant.assembly_id,
                "invite_id": invite.id,
                "source": source.as_str(),
            })),
    );

    Ok((registrant, assembly.name))
}

async fn find_invite(state: &AppState, code: &str) -> AppResult<Invite> {
    let code = parse_invite_code(code)?;
    InviteRepo::find_by_code(&state.pool, &code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No invite with code {code}")))
}

/// Normalize and validate the submitted details.
fn build_registrant(
    invite_id: DbId,
    input: RegistrationRequest,
    source: RegistrationSource,
) -> Result<CreateRegistrant, CoreError> {
    let first_name = required_name("first_name", &input.first_name)?;
    let last_name = required_name("last_name", &input.last_name)?;
    let preferred = ContactChannel::parse(&input.preferred_channel)?;

    let email = non_blank(input.email);
    let phone = non_blank(input.phone);
    let postal_address = non_blank(input.postal_address);
    validate_contact(
        preferred,
        &ContactDetails {
            email: email.as_deref(),
            phone: phone.as_deref(),
            postal_address: postal_address.as_deref(),
        },
    )?;
    let phone = phone.as_deref().map(normalize_phone).transpose()?;

    validate_attributes(&input.attributes)?;
    let attributes: BTreeMap<String, String> = input
        .attributes
        .into_iter()
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    Ok(CreateRegistrant {
        invite_id,
        first_name,
        last_name,
        email: email.map(|e| e.to_lowercase()),
        phone,
        postal_address,
        preferred_channel: preferred.as_str().to_string(),
        attributes: json!(attributes),
        needs: non_blank(input.needs),
        source: source.as_str().to_string(),
    })
}

fn required_name(field: &str, value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn request() -> RegistrationRequest {
        RegistrationRequest {
            first_name: "  Ada ".into(),
            last_name: "Lovelace".into(),
            email: Some("Ada@Example.org".into()),
            phone: Some("020 7946 0958".into()),
            postal_address: Some("   ".into()),
            preferred_channel: "email".into(),
            attributes: BTreeMap::from([(" age_band ".into(), " 30-44 ".into())]),
            needs: Some("".into()),
        }
    }

    #[test]
    fn details_are_normalized() {
        let create = build_registrant(7, request(), RegistrationSource::Web).unwrap();

        assert_eq!(create.invite_id, 7);
        assert_eq!(create.first_name, "Ada");
        assert_eq!(create.email.as_deref(), Some("ada@example.org"));
        assert_eq!(create.phone.as_deref(), Some("02079460958"));
        assert_eq!(create.postal_address, None);
        assert_eq!(create.needs, None);
        assert_eq!(create.attributes["age_band"], "30-44");
        assert_eq!(create.source, "web");
    }

    #[test]
    fn preferred_channel_needs_matching_detail() {
        let input = RegistrationRequest {
            preferred_channel: "post".into(),
            ..request()
        };
        assert_matches!(
            build_registrant(1, input, RegistrationSource::Phone),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn blank_names_rejected() {
        let input = RegistrationRequest {
            last_name: " ".into(),
            ..request()
        };
        assert_matches!(
            build_registrant(1, input, RegistrationSource::Email),
            Err(CoreError::Validation(msg)) if msg.contains("last_name")
        );
    }
}
