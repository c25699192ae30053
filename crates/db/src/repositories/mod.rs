//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod assembly_repo;
pub mod backup_code_repo;
pub mod confirmation_repo;
pub mod event_repo;
pub mod invite_repo;
pub mod refresh_session_repo;
pub mod registrant_repo;
pub mod role_repo;
pub mod selection_repo;
pub mod user_repo;

pub use assembly_repo::AssemblyRepo;
pub use backup_code_repo::BackupCodeRepo;
pub use confirmation_repo::ConfirmationRepo;
pub use event_repo::EventRepo;
pub use invite_repo::{InviteBatchRepo, InviteRepo};
pub use refresh_session_repo::RefreshSessionRepo;
pub use registrant_repo::RegistrantRepo;
pub use role_repo::RoleRepo;
pub use selection_repo::SelectionRunRepo;
pub use user_repo::UserRepo;
