//! The task runner: the one code path every dispatch mode goes through.

use std::sync::Arc;

use super::{
    ActionRegistry, BulkExecutor, Clock, ExecutionFault, SnapshotCapturer, StaleOperationReaper,
};
use crate::domain::{
    DomainError, ExecutionReport, IdentityProvider, OperationRepository, OperationStatus,
};

/// What a runner invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// No operation with that id
    Missing,
    /// The operation was not PENDING (already run, running, or claimed by
    /// another runner); nothing changed.
    Skipped(OperationStatus),
    Killed,
    Completed,
    Failed,
}

pub struct BulkTaskRunner {
    operations: Arc<dyn OperationRepository>,
    registry: Arc<ActionRegistry>,
    identities: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    reaper: StaleOperationReaper,
    snapshots: SnapshotCapturer,
    executor: BulkExecutor,
}

impl BulkTaskRunner {
    pub fn new(
        operations: Arc<dyn OperationRepository>,
        registry: Arc<ActionRegistry>,
        identities: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        stale_after_minutes: i64,
    ) -> Self {
        Self {
            reaper: StaleOperationReaper::new(operations.clone(), stale_after_minutes),
            snapshots: SnapshotCapturer::new(operations.clone()),
            executor: BulkExecutor::new(),
            operations,
            registry,
            identities,
            clock,
        }
    }

    pub fn operations(&self) -> &Arc<dyn OperationRepository> {
        &self.operations
    }

    /// Run one operation to a terminal state.
    ///
    /// Only storage errors while reading or writing the operation itself are
    /// returned; everything that goes wrong during execution is recorded on
    /// the operation.
    pub async fn run(&self, id: i32) -> Result<RunOutcome, DomainError> {
        let Some(operation) = self.operations.find_by_id(id).await? else {
            tracing::warn!("Bulk operation #{} not found", id);
            return Ok(RunOutcome::Missing);
        };

        if operation.status != OperationStatus::Pending {
            tracing::debug!(
                "Bulk operation #{} is {}; nothing to run",
                id,
                operation.status
            );
            return Ok(RunOutcome::Skipped(operation.status));
        }

        let now = self.clock.now();
        if self.reaper.is_stale(&operation, now) {
            return if self.reaper.reap(&operation, now).await? {
                Ok(RunOutcome::Killed)
            } else {
                self.current_status(id).await
            };
        }

        if !self.operations.mark_started(id, now).await? {
            return self.current_status(id).await;
        }
        tracing::info!("⚙️ Running bulk operation #{} ({})", id, operation.action);

        let Some(handler) = self.registry.get(operation.action) else {
            return self
                .fail(id, ExecutionFault::NotImplemented(operation.action), ExecutionReport::default())
                .await;
        };

        let snapshot = match self.snapshots.capture(&operation, handler.as_ref()).await {
            Ok(snapshot) => snapshot,
            Err(fault) => return self.fail(id, fault, ExecutionReport::default()).await,
        };

        let actor = match self.identities.resolve(operation.created_by_id).await {
            Ok(actor) => actor,
            Err(source) => {
                let fault = ExecutionFault::Identity {
                    user_id: operation.created_by_id,
                    source,
                };
                return self.fail(id, fault, ExecutionReport::default()).await;
            }
        };

        let execution = self
            .executor
            .execute(&operation, handler.as_ref(), &actor, &snapshot)
            .await;

        if let Some(fault) = execution.fault {
            // The executor already recorded the fault message in the report.
            tracing::error!("❌ Bulk operation #{} aborted: {}", id, fault);
            self.finish(id, OperationStatus::Failed, &execution.report)
                .await?;
            return Ok(RunOutcome::Failed);
        }

        self.finish(id, OperationStatus::Completed, &execution.report)
            .await?;
        tracing::info!(
            "✅ Bulk operation #{} completed: {} succeeded, {} failed",
            id,
            execution.report.success_count(),
            execution.report.failure_count()
        );
        Ok(RunOutcome::Completed)
    }

    async fn fail(
        &self,
        id: i32,
        fault: ExecutionFault,
        mut report: ExecutionReport,
    ) -> Result<RunOutcome, DomainError> {
        tracing::error!("❌ Bulk operation #{} failed: {}", id, fault);
        report.errors.push(fault.to_string());
        self.finish(id, OperationStatus::Failed, &report).await?;
        Ok(RunOutcome::Failed)
    }

    async fn finish(
        &self,
        id: i32,
        status: OperationStatus,
        report: &ExecutionReport,
    ) -> Result<(), DomainError> {
        let written = self
            .operations
            .finish(id, status, report, self.clock.now())
            .await?;
        if !written {
            return Err(DomainError::Internal(format!(
                "bulk operation #{} left IN_PROGRESS while it was running",
                id
            )));
        }
        Ok(())
    }

    async fn current_status(&self, id: i32) -> Result<RunOutcome, DomainError> {
        let status = self
            .operations
            .find_by_id(id)
            .await?
            .map(|op| op.status)
            .ok_or(DomainError::NotFound)?;
        Ok(RunOutcome::Skipped(status))
    }
}
