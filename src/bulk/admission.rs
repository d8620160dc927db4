//! Admission: decides whether an operation may be accepted before any side
//! effect happens. The only write is the PENDING record itself.

use serde_json::Value;
use std::sync::Arc;

use super::{ActionRegistry, BulkError, Clock};
use crate::domain::{
    Actor, BulkAction, NewOperation, OperationRepository, OperationRequest, ValidationErrors,
    NON_FIELD_ERRORS,
};

pub struct AdmissionController {
    registry: Arc<ActionRegistry>,
    operations: Arc<dyn OperationRepository>,
    clock: Arc<dyn Clock>,
    max_records: u64,
}

impl AdmissionController {
    pub fn new(
        registry: Arc<ActionRegistry>,
        operations: Arc<dyn OperationRepository>,
        clock: Arc<dyn Clock>,
        max_records: u64,
    ) -> Self {
        Self {
            registry,
            operations,
            clock,
            max_records,
        }
    }

    /// Validate, size and persist an operation as PENDING.
    pub async fn admit(
        &self,
        action: BulkAction,
        filters: Value,
        payload: Value,
        actor: &Actor,
    ) -> Result<OperationRequest, BulkError> {
        let handler = self.registry.get(action).ok_or_else(|| {
            BulkError::Validation(ValidationErrors::single(
                "action",
                format!("Action {} is not supported.", action),
            ))
        })?;

        handler
            .validate(&filters, &payload)
            .map_err(BulkError::Validation)?;

        let count = handler.count_matches(&filters).await?;
        if count == 0 {
            return Err(BulkError::Validation(ValidationErrors::single(
                "filters",
                "No records match the provided filters.",
            )));
        }
        self.check_limit(count)?;

        // The set may grow between counting and listing; one extra id is
        // enough to tell.
        let record_ids = handler
            .match_ids(&filters, self.max_records.saturating_add(1))
            .await?;
        self.check_limit(record_ids.len() as u64)?;
        if record_ids.is_empty() {
            return Err(BulkError::Validation(ValidationErrors::single(
                NON_FIELD_ERRORS,
                "Matched records changed during admission. Please retry.",
            )));
        }

        let operation = self
            .operations
            .create(NewOperation {
                action,
                filters,
                payload,
                created_by_id: actor.id,
                created_at: self.clock.now(),
                record_ids,
            })
            .await?;

        tracing::info!(
            "Admitted bulk operation #{} ({}) by {} matching {} records",
            operation.id,
            operation.action,
            actor.username,
            operation.matched_count
        );

        Ok(operation)
    }

    fn check_limit(&self, count: u64) -> Result<(), BulkError> {
        if count > self.max_records {
            tracing::warn!(
                "Rejected bulk operation: {} records over the limit of {}",
                count,
                self.max_records
            );
            return Err(BulkError::Admission {
                limit: self.max_records,
                count,
            });
        }
        Ok(())
    }
}
