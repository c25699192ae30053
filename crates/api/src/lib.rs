//! OpenDLP API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! background jobs) so integration tests, the server binary and the
//! `create-admin` tool can all reach them.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
