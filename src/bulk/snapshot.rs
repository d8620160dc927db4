use std::sync::Arc;

use super::{BulkActionHandler, ExecutionFault, SnapshotRecord};
use crate::domain::{OperationRepository, OperationRequest};

/// Records the pre-mutation state of an operation's matched records, once.
pub struct SnapshotCapturer {
    operations: Arc<dyn OperationRepository>,
}

impl SnapshotCapturer {
    pub fn new(operations: Arc<dyn OperationRepository>) -> Self {
        Self { operations }
    }

    /// Capture and persist the snapshot. Must run after the operation was
    /// claimed and before any record is mutated.
    pub async fn capture(
        &self,
        operation: &OperationRequest,
        handler: &dyn BulkActionHandler,
    ) -> Result<Vec<SnapshotRecord>, ExecutionFault> {
        if operation.snapshot.is_some() {
            return Err(ExecutionFault::Snapshot(
                "snapshot was already captured".to_string(),
            ));
        }

        let records = handler
            .capture(&operation.record_ids)
            .await
            .map_err(|e| ExecutionFault::Snapshot(e.to_string()))?;

        let serialized = serde_json::to_string(&records)
            .map_err(|e| ExecutionFault::Snapshot(e.to_string()))?;

        let written = self
            .operations
            .save_snapshot(operation.id, &serialized)
            .await
            .map_err(|e| ExecutionFault::Snapshot(e.to_string()))?;
        if !written {
            return Err(ExecutionFault::Snapshot(
                "snapshot was already captured".to_string(),
            ));
        }

        tracing::debug!(
            "Captured snapshot of {} records for bulk operation #{}",
            records.len(),
            operation.id
        );
        Ok(records)
    }
}
