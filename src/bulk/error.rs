use thiserror::Error;

use crate::domain::{BulkAction, DomainError, ValidationErrors};

/// Errors returned synchronously to a submitter or reader.
#[derive(Debug, Error)]
pub enum BulkError {
    /// Malformed or incomplete filters/payload; nothing was persisted.
    #[error("invalid bulk operation: {0}")]
    Validation(ValidationErrors),
    /// Matched record count over the limit; nothing was persisted.
    #[error("Bulk update should include less than {limit}. Current count is {count}")]
    Admission { limit: u64, count: u64 },
    #[error("bulk operation {0} not found")]
    NotFound(i32),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Failure of one record's mutation.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// Business-rule violation local to the record; the batch continues.
    #[error("record rejected: {0}")]
    Record(ValidationErrors),
    /// Anything else; the batch is aborted.
    #[error(transparent)]
    Fatal(#[from] DomainError),
}

/// Faults that abort an operation and move it to FAILED.
#[derive(Debug, Error)]
pub enum ExecutionFault {
    #[error("No executor registered for action {0}")]
    NotImplemented(BulkAction),
    #[error("Unable to resolve requesting user {user_id}: {source}")]
    Identity { user_id: i32, source: DomainError },
    #[error("Snapshot capture failed: {0}")]
    Snapshot(String),
    #[error("Execution aborted at record {id}: {source}")]
    Record { id: i32, source: DomainError },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission_message_names_both_counts() {
        let err = BulkError::Admission {
            limit: 10,
            count: 11,
        };
        assert_eq!(
            err.to_string(),
            "Bulk update should include less than 10. Current count is 11"
        );
    }
}
