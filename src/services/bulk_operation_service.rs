//! Bulk Operation Service - submission and query surface of the engine
//!
//! Callers submit and then poll by id; execution outcomes are never returned
//! from `submit`.

use serde_json::Value;
use std::sync::Arc;

use crate::bulk::{
    AdmissionController, BulkError, OperationView, ResultMaterializer, TaskDispatch,
};
use crate::domain::{Actor, BulkAction, OperationFilter, OperationRepository, OperationRequest};

pub struct BulkOperationService {
    admission: AdmissionController,
    operations: Arc<dyn OperationRepository>,
    dispatch: Arc<dyn TaskDispatch>,
    materializer: ResultMaterializer,
}

impl BulkOperationService {
    pub fn new(
        admission: AdmissionController,
        operations: Arc<dyn OperationRepository>,
        dispatch: Arc<dyn TaskDispatch>,
        materializer: ResultMaterializer,
    ) -> Self {
        Self {
            admission,
            operations,
            dispatch,
            materializer,
        }
    }

    /// Admit an operation and hand it to the task runner.
    ///
    /// Returns the operation as admitted (PENDING). A dispatch failure leaves
    /// it PENDING for the polling worker and is only logged.
    pub async fn submit(
        &self,
        action: BulkAction,
        filters: Value,
        payload: Value,
        actor: &Actor,
    ) -> Result<OperationRequest, BulkError> {
        let operation = self.admission.admit(action, filters, payload, actor).await?;

        if let Err(e) = self.dispatch.dispatch(operation.id).await {
            tracing::error!(
                "Failed to dispatch bulk operation #{}: {}",
                operation.id,
                e
            );
        }

        Ok(operation)
    }

    pub async fn get(&self, id: i32) -> Result<OperationRequest, BulkError> {
        self.operations
            .find_by_id(id)
            .await?
            .ok_or(BulkError::NotFound(id))
    }

    pub async fn list(&self, filter: OperationFilter) -> Result<Vec<OperationRequest>, BulkError> {
        Ok(self.operations.find_all(filter).await?)
    }

    pub fn view(&self, operation: &OperationRequest) -> OperationView {
        self.materializer.view(operation)
    }
}
