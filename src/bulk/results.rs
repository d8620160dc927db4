//! Read-side view of operations and their outcome lists.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::domain::{
    BulkAction, OperationRequest, OperationStatus, OutcomeEntry, ValidationErrors,
};

/// One record's outcome as served to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkResult {
    pub id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationView {
    pub id: i32,
    pub action: BulkAction,
    pub status: OperationStatus,
    pub filters: Value,
    pub payload: Value,
    pub created_by_id: i32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub matched_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub errors: Vec<String>,
    pub snapshot_captured: bool,
    pub success_list: Vec<BulkResult>,
    pub failure_list: Vec<BulkResult>,
}

/// Turns stored outcome entries into results with absolute frontend links.
/// Links come from what was stored at execution time, so entries resolve even
/// after the underlying record was deleted.
#[derive(Debug, Clone)]
pub struct ResultMaterializer {
    frontend_base_url: String,
}

impl ResultMaterializer {
    pub fn new(frontend_base_url: impl Into<String>) -> Self {
        let base: String = frontend_base_url.into();
        Self {
            frontend_base_url: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn materialize(&self, entries: &[OutcomeEntry]) -> Vec<BulkResult> {
        entries
            .iter()
            .map(|entry| BulkResult {
                id: entry.id,
                frontend_url: entry
                    .frontend_path
                    .as_ref()
                    .map(|path| format!("{}{}", self.frontend_base_url, path)),
                errors: entry.errors.clone(),
            })
            .collect()
    }

    pub fn view(&self, operation: &OperationRequest) -> OperationView {
        OperationView {
            id: operation.id,
            action: operation.action,
            status: operation.status,
            filters: operation.filters.clone(),
            payload: operation.payload.clone(),
            created_by_id: operation.created_by_id,
            created_at: operation.created_at,
            started_at: operation.started_at,
            completed_at: operation.completed_at,
            matched_count: operation.matched_count,
            success_count: operation.success_count,
            failure_count: operation.failure_count,
            errors: operation.errors.clone(),
            snapshot_captured: operation.snapshot.is_some(),
            success_list: self.materialize(&operation.success_list),
            failure_list: self.materialize(&operation.failure_list),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_prefixed_with_base_url() {
        let materializer = ResultMaterializer::new("https://displacement.example.org/");
        let results = materializer.materialize(&[
            OutcomeEntry::success(4, Some("/entries/9/?id=4".to_string())),
            OutcomeEntry::failure(5, None, Some(ValidationErrors::single("id", "gone"))),
        ]);

        assert_eq!(
            results[0].frontend_url.as_deref(),
            Some("https://displacement.example.org/entries/9/?id=4")
        );
        assert_eq!(results[1].id, 5);
        assert!(results[1].frontend_url.is_none());
        assert!(results[1].errors.is_some());
    }
}
