//! Applies an admitted, snapshotted operation record by record.

use std::collections::HashMap;

use super::actions::RECORD_GONE;
use super::{ApplyError, BulkActionHandler, ExecutionFault, SnapshotRecord};
use crate::domain::{Actor, ExecutionReport, OperationRequest, OutcomeEntry, ValidationErrors};

/// Result of one execution. A fault means the loop stopped early and the
/// report holds only what completed before it.
#[derive(Debug)]
pub struct Execution {
    pub report: ExecutionReport,
    pub fault: Option<ExecutionFault>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BulkExecutor;

impl BulkExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Run `handler` over the operation's admitted records as `actor`.
    ///
    /// Records are processed sequentially in admission order. Lacking the
    /// action's capability fails every record without touching any.
    pub async fn execute(
        &self,
        operation: &OperationRequest,
        handler: &dyn BulkActionHandler,
        actor: &Actor,
        snapshot: &[SnapshotRecord],
    ) -> Execution {
        let mut report = ExecutionReport::default();
        let by_id: HashMap<i32, &SnapshotRecord> =
            snapshot.iter().map(|record| (record.id, record)).collect();
        let path_of = |id: i32| by_id.get(&id).and_then(|r| r.frontend_path.clone());

        let capability = handler.capability();
        if !actor.has_permission(capability) {
            tracing::warn!(
                "{} lacks {} for bulk operation #{}; failing all {} records",
                actor.username,
                capability,
                operation.id,
                operation.record_ids.len()
            );
            report.errors.push(format!(
                "User {} does not have the {} permission.",
                actor.username, capability
            ));
            report.failure_list = operation
                .record_ids
                .iter()
                .map(|&id| OutcomeEntry::failure(id, path_of(id), None))
                .collect();
            return Execution {
                report,
                fault: None,
            };
        }

        for &id in &operation.record_ids {
            let Some(record) = by_id.get(&id) else {
                report.failure_list.push(OutcomeEntry::failure(
                    id,
                    None,
                    Some(ValidationErrors::single("id", RECORD_GONE)),
                ));
                continue;
            };

            match handler.apply(record, &operation.payload, actor).await {
                Ok(()) => report
                    .success_list
                    .push(OutcomeEntry::success(id, record.frontend_path.clone())),
                Err(ApplyError::Record(errors)) => {
                    tracing::debug!(
                        "Bulk operation #{}: record {} rejected: {}",
                        operation.id,
                        id,
                        errors
                    );
                    report.failure_list.push(OutcomeEntry::failure(
                        id,
                        record.frontend_path.clone(),
                        Some(errors),
                    ))
                }
                Err(ApplyError::Fatal(source)) => {
                    let fault = ExecutionFault::Record { id, source };
                    report.errors.push(fault.to_string());
                    return Execution {
                        report,
                        fault: Some(fault),
                    };
                }
            }
        }

        Execution {
            report,
            fault: None,
        }
    }
}
