//! Well-known role name constants.
//!
//! These must match the seed data in `20260301000002_create_users_and_roles.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_PROJECT_MANAGER: &str = "project_manager";
pub const ROLE_CLIENT: &str = "client";
pub const ROLE_CONFIRMATION_CALLER: &str = "confirmation_caller";

/// Roles allowed to author assemblies, invites, and selection runs.
pub const MANAGER_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_PROJECT_MANAGER];

/// Roles allowed to review an assembly specification.
pub const REVIEWER_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_PROJECT_MANAGER, ROLE_CLIENT];

/// Roles allowed to record confirmation calls.
pub const CALLER_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_PROJECT_MANAGER, ROLE_CONFIRMATION_CALLER];

/// Return `true` if `role` is one of `allowed`.
pub fn role_in(role: &str, allowed: &[&str]) -> bool {
    allowed.contains(&role)
}
