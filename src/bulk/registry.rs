//! Action registry: maps a [`BulkAction`] to the handler that knows how to
//! validate, match, capture and apply it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::ApplyError;
use crate::domain::{Actor, BulkAction, Capability, DomainError, ValidationErrors};

/// Pre-mutation state of one matched record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub id: i32,
    /// Link of the record relative to the frontend root, kept so results stay
    /// resolvable after the record is gone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend_path: Option<String>,
    pub data: Value,
}

#[async_trait]
pub trait BulkActionHandler: Send + Sync {
    fn action(&self) -> BulkAction;

    /// Blanket permission the requester needs for any record to be touched.
    fn capability(&self) -> Capability;

    /// Shape check of `filters` and `payload`; errors are tagged with the
    /// offending sub-field.
    fn validate(&self, filters: &Value, payload: &Value) -> Result<(), ValidationErrors>;

    /// Size of the matched record set. Read-only.
    async fn count_matches(&self, filters: &Value) -> Result<u64, DomainError>;

    /// Ids of the matched record set in iteration order. Read-only.
    async fn match_ids(&self, filters: &Value, limit: u64) -> Result<Vec<i32>, DomainError>;

    /// Current state of the given records, in the order of `ids`. Records that
    /// no longer exist are omitted.
    async fn capture(&self, ids: &[i32]) -> Result<Vec<SnapshotRecord>, DomainError>;

    /// Mutate one record as `actor`.
    async fn apply(
        &self,
        record: &SnapshotRecord,
        payload: &Value,
        actor: &Actor,
    ) -> Result<(), ApplyError>;
}

#[derive(Default, Clone)]
pub struct ActionRegistry {
    handlers: HashMap<BulkAction, Arc<dyn BulkActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own action, replacing any previous one.
    pub fn register(&mut self, handler: Arc<dyn BulkActionHandler>) -> &mut Self {
        self.handlers.insert(handler.action(), handler);
        self
    }

    pub fn with(mut self, handler: Arc<dyn BulkActionHandler>) -> Self {
        self.register(handler);
        self
    }

    pub fn get(&self, action: BulkAction) -> Option<Arc<dyn BulkActionHandler>> {
        self.handlers.get(&action).cloned()
    }
}
