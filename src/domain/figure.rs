//! Displacement figures and the business rules any figure mutation must pass.
//!
//! The rules here are the same ones a single-figure edit applies; bulk actions
//! call them per record.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FigureRole {
    Recommended,
    Triangulation,
}

impl FigureRole {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "RECOMMENDED" => Some(FigureRole::Recommended),
            "TRIANGULATION" => Some(FigureRole::Triangulation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FigureRole::Recommended => "RECOMMENDED",
            FigureRole::Triangulation => "TRIANGULATION",
        }
    }
}

impl fmt::Display for FigureRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    UnderReview,
    ReviewInProgress,
    SignedOff,
}

impl ReviewStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "UNDER_REVIEW" => Some(ReviewStatus::UnderReview),
            "REVIEW_IN_PROGRESS" => Some(ReviewStatus::ReviewInProgress),
            "SIGNED_OFF" => Some(ReviewStatus::SignedOff),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::UnderReview => "UNDER_REVIEW",
            ReviewStatus::ReviewInProgress => "REVIEW_IN_PROGRESS",
            ReviewStatus::SignedOff => "SIGNED_OFF",
        }
    }
}

/// Figure data as seen by the engine and captured in snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub id: i32,
    pub event_id: i32,
    pub entry_id: i32,
    pub country: String,
    pub category: String,
    pub role: String,
    pub include_idu: bool,
    pub quantity: i64,
    pub last_modified_by_id: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

impl Figure {
    /// Path of the figure inside the entry form, relative to the frontend root.
    pub fn frontend_path(&self) -> String {
        format!("/entries/{}/?id={}#/figure-and-analysis", self.entry_id, self.id)
    }
}

fn check_event_open(event_status: Option<ReviewStatus>, errors: &mut ValidationErrors) {
    if event_status == Some(ReviewStatus::SignedOff) {
        errors.add(
            "event",
            "Figures of a signed-off event cannot be modified.",
        );
    }
}

/// Rules for changing the role of one figure.
pub fn validate_role_change(
    figure: &Figure,
    new_role: FigureRole,
    event_status: Option<ReviewStatus>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_event_open(event_status, &mut errors);

    if new_role == FigureRole::Triangulation && figure.include_idu {
        errors.add(
            "role",
            "Triangulation figures cannot be included in the IDU.",
        );
    }

    errors.into_result()
}

/// Rules for deleting one figure.
pub fn validate_deletion(event_status: Option<ReviewStatus>) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_event_open(event_status, &mut errors);
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn figure(include_idu: bool) -> Figure {
        Figure {
            id: 7,
            event_id: 2,
            entry_id: 40,
            country: "NPL".to_string(),
            category: "IDPS".to_string(),
            role: "RECOMMENDED".to_string(),
            include_idu,
            quantity: 1200,
            last_modified_by_id: None,
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            updated_at: "2024-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_role_change_allowed_on_open_event() {
        let result = validate_role_change(
            &figure(false),
            FigureRole::Triangulation,
            Some(ReviewStatus::UnderReview),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_triangulation_rejected_for_idu_figure() {
        let errors = validate_role_change(&figure(true), FigureRole::Triangulation, None)
            .expect_err("idu figure must not become triangulation");
        assert!(errors.get("role").is_some());
        assert!(errors.get("event").is_none());
    }

    #[test]
    fn test_signed_off_event_blocks_every_mutation() {
        let errors = validate_role_change(
            &figure(false),
            FigureRole::Recommended,
            Some(ReviewStatus::SignedOff),
        )
        .unwrap_err();
        assert!(errors.get("event").is_some());

        assert!(validate_deletion(Some(ReviewStatus::SignedOff)).is_err());
        assert!(validate_deletion(Some(ReviewStatus::ReviewInProgress)).is_ok());
    }

    #[test]
    fn test_frontend_path_points_at_entry_form() {
        assert_eq!(
            figure(false).frontend_path(),
            "/entries/40/?id=7#/figure-and-analysis"
        );
    }
}
