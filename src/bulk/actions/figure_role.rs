//! `FIGURE_ROLE`: set the role of every matched figure.
//!
//! ```json
//! filters: { "figure_role": { "figure": { "events": [12], "roles": ["RECOMMENDED"] } } }
//! payload: { "figure_role": { "role": "TRIANGULATION" } }
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::documents::{action_group, figure_filter, required_string};
use super::{capture_figures, RECORD_GONE};
use crate::bulk::{ApplyError, BulkActionHandler, SnapshotRecord};
use crate::domain::figure::validate_role_change;
use crate::domain::{
    Actor, BulkAction, Capability, DomainError, FigureRepository, FigureRole, ValidationErrors,
};

const ROLE_FIELD: &str = "payload.figure_role.role";

pub struct FigureRoleAction {
    figures: Arc<dyn FigureRepository>,
}

impl FigureRoleAction {
    pub fn new(figures: Arc<dyn FigureRepository>) -> Self {
        Self { figures }
    }
}

fn parse_role(payload: &Value) -> Result<FigureRole, ValidationErrors> {
    let group = action_group(payload, "payload", BulkAction::FigureRole)?;
    let value = required_string(group, "role", ROLE_FIELD)?;
    FigureRole::parse(value).ok_or_else(|| {
        ValidationErrors::single(
            ROLE_FIELD,
            format!("'{}' is not a valid figure role.", value),
        )
    })
}

#[async_trait]
impl BulkActionHandler for FigureRoleAction {
    fn action(&self) -> BulkAction {
        BulkAction::FigureRole
    }

    fn capability(&self) -> Capability {
        Capability::ChangeFigure
    }

    fn validate(&self, filters: &Value, payload: &Value) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = figure_filter(filters, BulkAction::FigureRole) {
            errors.merge(e);
        }
        if let Err(e) = parse_role(payload) {
            errors.merge(e);
        }
        errors.into_result()
    }

    async fn count_matches(&self, filters: &Value) -> Result<u64, DomainError> {
        let filter = figure_filter(filters, BulkAction::FigureRole)
            .map_err(|e| DomainError::Validation(e.to_string()))?;
        self.figures.count(&filter).await
    }

    async fn match_ids(&self, filters: &Value, limit: u64) -> Result<Vec<i32>, DomainError> {
        let filter = figure_filter(filters, BulkAction::FigureRole)
            .map_err(|e| DomainError::Validation(e.to_string()))?;
        self.figures.find_ids(&filter, limit).await
    }

    async fn capture(&self, ids: &[i32]) -> Result<Vec<SnapshotRecord>, DomainError> {
        capture_figures(self.figures.as_ref(), ids).await
    }

    async fn apply(
        &self,
        record: &SnapshotRecord,
        payload: &Value,
        actor: &Actor,
    ) -> Result<(), ApplyError> {
        let role = parse_role(payload).map_err(ApplyError::Record)?;

        let Some(figure) = self.figures.find_by_id(record.id).await? else {
            return Err(ApplyError::Record(ValidationErrors::single("id", RECORD_GONE)));
        };

        let event_status = self.figures.event_review_status(figure.event_id).await?;
        validate_role_change(&figure, role, event_status).map_err(ApplyError::Record)?;

        match self.figures.update_role(figure.id, role, actor.id).await {
            Ok(_) => Ok(()),
            Err(DomainError::NotFound) => Err(ApplyError::Record(ValidationErrors::single(
                "id",
                RECORD_GONE,
            ))),
            Err(e) => Err(ApplyError::Fatal(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_role_is_required() {
        let errors = parse_role(&json!({ "figure_role": {} })).unwrap_err();
        assert_eq!(
            errors.get(ROLE_FIELD),
            Some(&["This field is required.".to_string()][..])
        );
    }

    #[test]
    fn test_payload_role_must_be_known() {
        let errors = parse_role(&json!({ "figure_role": { "role": "PRIMARY" } })).unwrap_err();
        assert!(errors.get(ROLE_FIELD).is_some());
        assert_eq!(
            parse_role(&json!({ "figure_role": { "role": "TRIANGULATION" } })).unwrap(),
            FigureRole::Triangulation
        );
    }
}
