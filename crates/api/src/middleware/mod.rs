//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- the caller identified by a JWT Bearer token.
//! - [`rbac`] -- role guards built on top of it.

pub mod auth;
pub mod rbac;
