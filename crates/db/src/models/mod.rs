//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for inserts
//! - An update DTO (all `Option` fields) where rows are patchable

pub mod assembly;
pub mod backup_code;
pub mod confirmation;
pub mod event;
pub mod invite;
pub mod registrant;
pub mod role;
pub mod selection;
pub mod refresh_session;
pub mod user;
