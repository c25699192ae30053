//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing, verification and length policy.
//! - [`jwt`] -- access-token signing and validation, refresh-token helpers.

pub mod jwt;
pub mod password;
