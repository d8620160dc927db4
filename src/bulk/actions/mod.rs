//! Built-in bulk actions over displacement figures.

mod documents;
pub mod figure_delete;
pub mod figure_role;

use std::collections::HashMap;
use std::sync::Arc;

pub use figure_delete::FigureDeleteAction;
pub use figure_role::FigureRoleAction;

use super::{ActionRegistry, SnapshotRecord};
use crate::domain::{DomainError, Figure, FigureRepository};

/// Message recorded for a matched record that disappeared before it was applied.
pub const RECORD_GONE: &str = "Record no longer exists.";

/// Registry with every built-in action.
pub fn default_registry(figures: Arc<dyn FigureRepository>) -> ActionRegistry {
    ActionRegistry::new()
        .with(Arc::new(FigureRoleAction::new(figures.clone())))
        .with(Arc::new(FigureDeleteAction::new(figures)))
}

/// Snapshot the figures behind `ids`, keeping the order of `ids`.
async fn capture_figures(
    figures: &dyn FigureRepository,
    ids: &[i32],
) -> Result<Vec<SnapshotRecord>, DomainError> {
    let mut found: HashMap<i32, Figure> = figures
        .find_by_ids(ids)
        .await?
        .into_iter()
        .map(|figure| (figure.id, figure))
        .collect();

    let mut records = Vec::with_capacity(found.len());
    for id in ids {
        if let Some(figure) = found.remove(id) {
            records.push(SnapshotRecord {
                id: figure.id,
                frontend_path: Some(figure.frontend_path()),
                data: serde_json::to_value(&figure)?,
            });
        }
    }
    Ok(records)
}
