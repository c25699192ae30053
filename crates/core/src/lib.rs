pub mod assembly;
pub mod backup_codes;
pub mod confirmation;
pub mod error;
pub mod hashing;
pub mod invites;
pub mod page_actions;
pub mod registration;
pub mod roles;
pub mod secrets;
pub mod selection;
pub mod status;
pub mod tokens;
pub mod two_factor;
pub mod types;
