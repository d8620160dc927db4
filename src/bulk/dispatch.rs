//! How an admitted operation reaches the runner. All modes end in
//! [`BulkTaskRunner::run`], so they produce the same state transitions.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::BulkTaskRunner;
use crate::domain::DomainError;

#[async_trait]
pub trait TaskDispatch: Send + Sync {
    async fn dispatch(&self, operation_id: i32) -> Result<(), DomainError>;
}

/// Runs the operation before `dispatch` returns.
pub struct InlineDispatch {
    runner: Arc<BulkTaskRunner>,
}

impl InlineDispatch {
    pub fn new(runner: Arc<BulkTaskRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl TaskDispatch for InlineDispatch {
    async fn dispatch(&self, operation_id: i32) -> Result<(), DomainError> {
        self.runner.run(operation_id).await.map(|_| ())
    }
}

/// Hands operation ids to a background worker task, one operation at a time.
pub struct QueueDispatch {
    sender: mpsc::UnboundedSender<i32>,
}

impl QueueDispatch {
    /// Spawn the worker task. Must be called from within a tokio runtime.
    pub fn spawn(runner: Arc<BulkTaskRunner>) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<i32>();

        let handle = tokio::spawn(async move {
            tracing::info!("🔄 Bulk operation worker started");
            while let Some(id) = receiver.recv().await {
                if let Err(e) = runner.run(id).await {
                    tracing::error!("❌ Error running bulk operation #{}: {}", id, e);
                }
            }
            tracing::info!("Bulk operation worker stopped");
        });

        (Self { sender }, handle)
    }
}

#[async_trait]
impl TaskDispatch for QueueDispatch {
    async fn dispatch(&self, operation_id: i32) -> Result<(), DomainError> {
        self.sender
            .send(operation_id)
            .map_err(|_| DomainError::Internal("bulk operation queue is closed".to_string()))
    }
}

/// Leaves the operation PENDING for an out-of-process worker polling the store.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeferredDispatch;

#[async_trait]
impl TaskDispatch for DeferredDispatch {
    async fn dispatch(&self, operation_id: i32) -> Result<(), DomainError> {
        tracing::debug!("Bulk operation #{} left for the worker process", operation_id);
        Ok(())
    }
}
