//! Background jobs spawned by the server binary.
//!
//! Each job is a long-running async function meant for `tokio::spawn`
//! and stops when its [`CancellationToken`](tokio_util::sync::CancellationToken)
//! is cancelled.

pub mod session_cleanup;
