use std::sync::Arc;

use opendlp_core::secrets::SecretBox;
use opendlp_events::{EventBus, Outreach};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: opendlp_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Centralized event bus for publishing platform events.
    pub event_bus: Arc<EventBus>,
    /// Couriers for invitations and selection notices.
    pub outreach: Outreach,
    /// Encrypts TOTP secrets at rest.
    pub secrets: Arc<SecretBox>,
}
