//! OpenDLP event bus and outbound delivery.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`] -- the canonical domain event envelope.
//! - [`EventPersistence`] -- background service that durably writes every
//!   event to the `events` table.
//! - [`delivery`] -- couriers for email, SMS, and printed post, gathered
//!   behind [`Outreach`].
//! - [`templates`] -- invitation and selection notice wording.

pub mod bus;
pub mod delivery;
pub mod persistence;
pub mod templates;

pub use bus::{event_types, EventBus, PlatformEvent};
pub use delivery::email::{EmailConfig, EmailCourier};
pub use delivery::print::{PrintConfig, PrintCourier};
pub use delivery::sms::{SmsConfig, SmsCourier};
pub use delivery::{Channel, Courier, DeliveryError, DeliveryOutcome, OutboundMessage, Outreach};
pub use persistence::EventPersistence;
