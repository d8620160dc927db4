//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{
    DomainError, ExecutionReport, Figure, FigureRole, NewOperation, OperationRequest,
    OperationStatus, ReviewStatus,
};

/// Filter criteria for figure queries. Criteria combine with AND; list criteria match any value.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FigureFilter {
    pub ids: Option<Vec<i32>>,
    pub events: Option<Vec<i32>>,
    pub entries: Option<Vec<i32>>,
    pub countries: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub roles: Option<Vec<FigureRole>>,
    pub include_idu: Option<bool>,
}

impl FigureFilter {
    pub fn is_empty(&self) -> bool {
        self.ids.is_none()
            && self.events.is_none()
            && self.entries.is_none()
            && self.countries.is_none()
            && self.categories.is_none()
            && self.roles.is_none()
            && self.include_idu.is_none()
    }
}

/// Repository trait for Figure entity
#[async_trait]
pub trait FigureRepository: Send + Sync {
    /// Count figures matching the filter without loading them
    async fn count(&self, filter: &FigureFilter) -> Result<u64, DomainError>;

    /// Ids of matching figures in ascending order, at most `limit` of them
    async fn find_ids(&self, filter: &FigureFilter, limit: u64) -> Result<Vec<i32>, DomainError>;

    /// Figures with the given ids that still exist. Any number of ids.
    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Figure>, DomainError>;

    /// Find a figure by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<Figure>, DomainError>;

    /// Review status of an event, `None` when the event is unknown
    async fn event_review_status(&self, event_id: i32) -> Result<Option<ReviewStatus>, DomainError>;

    /// Set the role of a figure on behalf of a user
    async fn update_role(
        &self,
        id: i32,
        role: FigureRole,
        modified_by: i32,
    ) -> Result<Figure, DomainError>;

    /// Delete a figure by ID
    async fn delete(&self, id: i32) -> Result<(), DomainError>;
}

/// Filter criteria for listing operations
#[derive(Debug, Default, Clone)]
pub struct OperationFilter {
    pub status: Option<OperationStatus>,
    pub created_by_id: Option<i32>,
}

/// Durable store for bulk operations.
///
/// Every status write is conditional on the expected previous status and
/// reports whether it took effect, so two runners can never both win.
#[async_trait]
pub trait OperationRepository: Send + Sync {
    /// Persist an admitted operation as PENDING
    async fn create(&self, operation: NewOperation) -> Result<OperationRequest, DomainError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<OperationRequest>, DomainError>;

    /// Newest first
    async fn find_all(&self, filter: OperationFilter) -> Result<Vec<OperationRequest>, DomainError>;

    /// Oldest PENDING operations first
    async fn pending_ids(&self, limit: u64) -> Result<Vec<i32>, DomainError>;

    /// PENDING -> IN_PROGRESS
    async fn mark_started(&self, id: i32, at: DateTime<Utc>) -> Result<bool, DomainError>;

    /// PENDING -> KILLED
    async fn mark_killed(
        &self,
        id: i32,
        at: DateTime<Utc>,
        reason: String,
    ) -> Result<bool, DomainError>;

    /// Write the snapshot if none has been written yet
    async fn save_snapshot(&self, id: i32, snapshot: &str) -> Result<bool, DomainError>;

    /// IN_PROGRESS -> COMPLETED | FAILED, together with counts and outcome lists
    async fn finish(
        &self,
        id: i32,
        status: OperationStatus,
        report: &ExecutionReport,
        at: DateTime<Utc>,
    ) -> Result<bool, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_figure_filter_rejects_unknown_keys() {
        let parsed: Result<FigureFilter, _> =
            serde_json::from_value(serde_json::json!({ "countries": ["NPL"], "region": 3 }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_figure_filter_emptiness() {
        assert!(FigureFilter::default().is_empty());
        let filter: FigureFilter =
            serde_json::from_value(serde_json::json!({ "roles": ["TRIANGULATION"] })).unwrap();
        assert!(!filter.is_empty());
        assert_eq!(filter.roles, Some(vec![FigureRole::Triangulation]));
    }
}
