//! Parsing of the per-action `filters` / `payload` documents.

use serde_json::Value;

use crate::domain::{BulkAction, FigureFilter, ValidationErrors};

const REQUIRED: &str = "This field is required.";

/// The action's group inside `root` (`filters` or `payload`). Any other
/// top-level group is an error.
pub(super) fn action_group<'a>(
    root: &'a Value,
    root_name: &str,
    action: BulkAction,
) -> Result<&'a serde_json::Map<String, Value>, ValidationErrors> {
    let key = action.document_key();
    let Some(map) = root.as_object() else {
        return Err(ValidationErrors::single(root_name, "Must be an object."));
    };

    let mut errors = ValidationErrors::new();
    for other in map.keys().filter(|k| k.as_str() != key) {
        errors.add(
            root_name,
            format!("Unexpected group '{}' for action {}.", other, action),
        );
    }

    let field = format!("{}.{}", root_name, key);
    match map.get(key) {
        Some(Value::Object(group)) => errors.into_result().map(|_| group),
        Some(Value::Null) | None => {
            errors.add(field, REQUIRED);
            Err(errors)
        }
        Some(_) => {
            errors.add(field, "Must be an object.");
            Err(errors)
        }
    }
}

/// `filters.<action>.figure` as a typed filter. At least one criterion is required.
pub(super) fn figure_filter(
    filters: &Value,
    action: BulkAction,
) -> Result<FigureFilter, ValidationErrors> {
    let group = action_group(filters, "filters", action)?;
    let prefix = format!("filters.{}", action.document_key());

    let mut errors = ValidationErrors::new();
    for other in group.keys().filter(|k| k.as_str() != "figure") {
        errors.add(prefix.clone(), format!("Unexpected filter group '{}'.", other));
    }

    let field = format!("{}.figure", prefix);
    let figure = match group.get("figure") {
        Some(Value::Null) | None => {
            errors.add(field, REQUIRED);
            return Err(errors);
        }
        Some(figure) => figure,
    };

    match serde_json::from_value::<FigureFilter>(figure.clone()) {
        Ok(filter) if filter.is_empty() => {
            errors.add(field, "At least one filter criterion is required.");
            Err(errors)
        }
        Ok(filter) => errors.into_result().map(|_| filter),
        Err(e) => {
            errors.add(field, e.to_string());
            Err(errors)
        }
    }
}

pub(super) fn required_string<'a>(
    group: &'a serde_json::Map<String, Value>,
    key: &str,
    field: &str,
) -> Result<&'a str, ValidationErrors> {
    match group.get(key) {
        Some(Value::String(value)) => Ok(value),
        Some(Value::Null) | None => Err(ValidationErrors::single(field, REQUIRED)),
        Some(_) => Err(ValidationErrors::single(field, "Must be a string.")),
    }
}
