use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::domain::{DomainError, OperationRepository, OperationRequest, OperationStatus};

/// Kills operations that sat PENDING longer than the staleness window instead
/// of running them against outdated data.
pub struct StaleOperationReaper {
    operations: Arc<dyn OperationRepository>,
    stale_after: Duration,
}

impl StaleOperationReaper {
    pub fn new(operations: Arc<dyn OperationRepository>, stale_after_minutes: i64) -> Self {
        Self {
            operations,
            stale_after: Duration::minutes(stale_after_minutes),
        }
    }

    pub fn is_stale(&self, operation: &OperationRequest, now: DateTime<Utc>) -> bool {
        operation.status == OperationStatus::Pending
            && now - operation.created_at >= self.stale_after
    }

    /// Kill the operation if it is stale. Returns whether it was killed by this call.
    pub async fn reap(
        &self,
        operation: &OperationRequest,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        if !self.is_stale(operation, now) {
            return Ok(false);
        }

        let waited = (now - operation.created_at).num_minutes();
        let reason = format!(
            "Operation waited {} minutes without being executed (limit {}). Killed to avoid running against stale data.",
            waited,
            self.stale_after.num_minutes()
        );

        let killed = self
            .operations
            .mark_killed(operation.id, now, reason)
            .await?;
        if killed {
            tracing::warn!(
                "Killed stale bulk operation #{} after {} minutes pending",
                operation.id,
                waited
            );
        }
        Ok(killed)
    }
}
