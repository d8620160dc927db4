//! `FIGURE_DELETE`: delete every matched figure.
//!
//! ```json
//! filters: { "figure_delete": { "figure": { "ids": [4, 5, 6] } } }
//! payload: { "figure_delete": {} }
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::documents::{action_group, figure_filter};
use super::{capture_figures, RECORD_GONE};
use crate::bulk::{ApplyError, BulkActionHandler, SnapshotRecord};
use crate::domain::figure::validate_deletion;
use crate::domain::{Actor, BulkAction, Capability, DomainError, FigureRepository, ValidationErrors};

pub struct FigureDeleteAction {
    figures: Arc<dyn FigureRepository>,
}

impl FigureDeleteAction {
    pub fn new(figures: Arc<dyn FigureRepository>) -> Self {
        Self { figures }
    }
}

fn check_payload(payload: &Value) -> Result<(), ValidationErrors> {
    let group = action_group(payload, "payload", BulkAction::FigureDelete)?;
    let mut errors = ValidationErrors::new();
    for key in group.keys() {
        errors.add(
            "payload.figure_delete",
            format!("Unexpected field '{}'.", key),
        );
    }
    errors.into_result()
}

#[async_trait]
impl BulkActionHandler for FigureDeleteAction {
    fn action(&self) -> BulkAction {
        BulkAction::FigureDelete
    }

    fn capability(&self) -> Capability {
        Capability::DeleteFigure
    }

    fn validate(&self, filters: &Value, payload: &Value) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = figure_filter(filters, BulkAction::FigureDelete) {
            errors.merge(e);
        }
        if let Err(e) = check_payload(payload) {
            errors.merge(e);
        }
        errors.into_result()
    }

    async fn count_matches(&self, filters: &Value) -> Result<u64, DomainError> {
        let filter = figure_filter(filters, BulkAction::FigureDelete)
            .map_err(|e| DomainError::Validation(e.to_string()))?;
        self.figures.count(&filter).await
    }

    async fn match_ids(&self, filters: &Value, limit: u64) -> Result<Vec<i32>, DomainError> {
        let filter = figure_filter(filters, BulkAction::FigureDelete)
            .map_err(|e| DomainError::Validation(e.to_string()))?;
        self.figures.find_ids(&filter, limit).await
    }

    async fn capture(&self, ids: &[i32]) -> Result<Vec<SnapshotRecord>, DomainError> {
        capture_figures(self.figures.as_ref(), ids).await
    }

    async fn apply(
        &self,
        record: &SnapshotRecord,
        _payload: &Value,
        actor: &Actor,
    ) -> Result<(), ApplyError> {
        let Some(figure) = self.figures.find_by_id(record.id).await? else {
            return Err(ApplyError::Record(ValidationErrors::single("id", RECORD_GONE)));
        };

        let event_status = self.figures.event_review_status(figure.event_id).await?;
        validate_deletion(event_status).map_err(ApplyError::Record)?;

        tracing::debug!("{} deleting figure {}", actor.username, figure.id);
        match self.figures.delete(figure.id).await {
            Ok(()) => Ok(()),
            Err(DomainError::NotFound) => Err(ApplyError::Record(ValidationErrors::single(
                "id",
                RECORD_GONE,
            ))),
            Err(e) => Err(ApplyError::Fatal(e)),
        }
    }
}
