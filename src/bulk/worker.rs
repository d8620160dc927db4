//! Polling worker: picks PENDING operations from the store, oldest first.
//! Used by the `--worker` process and to recover operations whose dispatch
//! was lost.

use std::sync::Arc;
use std::time::Duration;

use super::{BulkTaskRunner, RunOutcome};
use crate::domain::DomainError;

/// Run every currently PENDING operation, up to `limit`. Returns how many
/// reached a terminal state through this sweep. An operation that errors is
/// logged and skipped so it cannot block the ones behind it.
pub async fn process_pending(runner: &BulkTaskRunner, limit: u64) -> Result<usize, DomainError> {
    let ids = runner.operations().pending_ids(limit).await?;
    let mut finished = 0;

    for id in ids {
        match runner.run(id).await {
            Ok(RunOutcome::Completed | RunOutcome::Failed | RunOutcome::Killed) => finished += 1,
            Ok(RunOutcome::Skipped(_) | RunOutcome::Missing) => {}
            Err(e) => {
                tracing::error!("❌ Error running bulk operation #{}: {}", id, e);
            }
        }
    }

    Ok(finished)
}

pub async fn run_worker(runner: Arc<BulkTaskRunner>, poll_interval: Duration) {
    tracing::info!("🔄 Bulk operation poller started");

    loop {
        match process_pending(&runner, 10).await {
            Ok(0) => tokio::time::sleep(poll_interval).await,
            Ok(n) => tracing::debug!("Processed {} bulk operations", n),
            Err(e) => {
                tracing::error!("❌ Error processing bulk operations: {}", e);
                tokio::time::sleep(poll_interval * 2).await;
            }
        }
    }
}
