//! Periodic purge of expired and revoked refresh-token sessions.

use std::time::Duration;

use opendlp_db::repositories::RefreshSessionRepo;
use opendlp_db::DbPool;
use tokio_util::sync::CancellationToken;

/// Run the session cleanup loop until `cancel` is triggered.
///
/// The first purge happens immediately, then once per `interval`.
pub async fn run(pool: DbPool, interval: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        "Session cleanup job started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session cleanup job stopping");
                break;
            }
            _ = ticker.tick() => {
                match RefreshSessionRepo::purge_stale(&pool).await {
                    Ok(0) => tracing::debug!("Session cleanup: nothing to purge"),
                    Ok(deleted) => tracing::info!(deleted, "Session cleanup: purged sessions"),
                    Err(e) => tracing::error!(error = %e, "Session cleanup failed"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "../../db/migrations")]
    async fn stops_when_cancelled(pool: DbPool) {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(pool, Duration::from_secs(3600), cancel.clone()));

        cancel.cancel();
        let finished = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(finished.is_ok(), "cleanup loop did not observe cancellation");
    }
}
