//! Bulk operation records and their lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::ValidationErrors;

/// Which executor applies an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BulkAction {
    FigureRole,
    FigureDelete,
}

impl BulkAction {
    pub const ALL: [BulkAction; 2] = [BulkAction::FigureRole, BulkAction::FigureDelete];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.as_str() == value)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BulkAction::FigureRole => "FIGURE_ROLE",
            BulkAction::FigureDelete => "FIGURE_DELETE",
        }
    }

    /// Key under which `filters` and `payload` carry this action's document.
    pub fn document_key(&self) -> &'static str {
        match self {
            BulkAction::FigureRole => "figure_role",
            BulkAction::FigureDelete => "figure_delete",
        }
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PENDING -> IN_PROGRESS -> {COMPLETED, FAILED}; PENDING -> KILLED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Killed,
}

impl OperationStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(OperationStatus::Pending),
            "IN_PROGRESS" => Some(OperationStatus::InProgress),
            "COMPLETED" => Some(OperationStatus::Completed),
            "FAILED" => Some(OperationStatus::Failed),
            "KILLED" => Some(OperationStatus::Killed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Pending => "PENDING",
            OperationStatus::InProgress => "IN_PROGRESS",
            OperationStatus::Completed => "COMPLETED",
            OperationStatus::Failed => "FAILED",
            OperationStatus::Killed => "KILLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationStatus::Completed | OperationStatus::Failed | OperationStatus::Killed
        )
    }

    pub fn can_transition_to(&self, next: OperationStatus) -> bool {
        use OperationStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress) | (Pending, Killed) | (InProgress, Completed) | (InProgress, Failed)
        )
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record's outcome, stored in `success_list` or `failure_list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeEntry {
    pub id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
}

impl OutcomeEntry {
    pub fn success(id: i32, frontend_path: Option<String>) -> Self {
        Self {
            id,
            frontend_path,
            errors: None,
        }
    }

    pub fn failure(id: i32, frontend_path: Option<String>, errors: Option<ValidationErrors>) -> Self {
        Self {
            id,
            frontend_path,
            errors,
        }
    }
}

/// The persisted bulk operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    pub id: i32,
    pub action: BulkAction,
    pub filters: Value,
    pub payload: Value,
    pub status: OperationStatus,
    pub created_by_id: i32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Record count admitted; upper bound for `success_count + failure_count`.
    pub matched_count: u64,
    /// Matched record ids in iteration order, fixed at admission.
    pub record_ids: Vec<i32>,
    pub success_count: u64,
    pub failure_count: u64,
    pub snapshot: Option<String>,
    pub errors: Vec<String>,
    pub success_list: Vec<OutcomeEntry>,
    pub failure_list: Vec<OutcomeEntry>,
}

/// Input for persisting an admitted operation
#[derive(Debug, Clone)]
pub struct NewOperation {
    pub action: BulkAction,
    pub filters: Value,
    pub payload: Value,
    pub created_by_id: i32,
    pub created_at: DateTime<Utc>,
    pub record_ids: Vec<i32>,
}

/// What an execution produced, possibly cut short by a fault.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionReport {
    pub success_list: Vec<OutcomeEntry>,
    pub failure_list: Vec<OutcomeEntry>,
    pub errors: Vec<String>,
}

impl ExecutionReport {
    pub fn success_count(&self) -> u64 {
        self.success_list.len() as u64
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_list.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_are_one_directional() {
        use OperationStatus::*;
        assert!(Pending.can_transition_to(InProgress));
        assert!(Pending.can_transition_to(Killed));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Failed));

        assert!(!InProgress.can_transition_to(Killed));
        assert!(!InProgress.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Completed));
        for terminal in [Completed, Failed, Killed] {
            assert!(terminal.is_terminal());
            for next in [Pending, InProgress, Completed, Failed, Killed] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_action_names() {
        assert_eq!(BulkAction::parse("FIGURE_ROLE"), Some(BulkAction::FigureRole));
        assert_eq!(BulkAction::FigureDelete.document_key(), "figure_delete");
        assert_eq!(BulkAction::parse("EVENT_MERGE"), None);
        assert_eq!(
            serde_json::to_value(BulkAction::FigureRole).unwrap(),
            serde_json::json!("FIGURE_ROLE")
        );
    }

    #[test]
    fn test_outcome_entry_omits_empty_fields() {
        let entry = OutcomeEntry::success(3, None);
        assert_eq!(serde_json::to_value(&entry).unwrap(), serde_json::json!({ "id": 3 }));
    }
}
