use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::bulk::BulkError;
use crate::domain::{
    BulkAction, DomainError, OperationFilter, OperationStatus, ValidationErrors, NON_FIELD_ERRORS,
};
use crate::infrastructure::auth::RequestActor;
use crate::infrastructure::AppState;

#[derive(Deserialize)]
pub struct SubmitBulkOperation {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub filters: Value,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Deserialize)]
pub struct OperationQuery {
    pub status: Option<String>,
    pub created_by: Option<i32>,
}

fn error_response(error: BulkError) -> (StatusCode, Json<Value>) {
    match error {
        BulkError::Validation(errors) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors })))
        }
        admission @ BulkError::Admission { .. } => {
            let errors = ValidationErrors::single(
                NON_FIELD_ERRORS,
                admission.to_string(),
            );
            (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors })))
        }
        BulkError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Bulk operation {} not found", id) })),
        ),
        BulkError::Domain(DomainError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Not found" })),
        ),
        BulkError::Domain(e) => {
            tracing::error!("Bulk operation request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}

pub async fn submit_operation(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Json(request): Json<SubmitBulkOperation>,
) -> impl IntoResponse {
    let Some(action) = BulkAction::parse(&request.action) else {
        let allowed: Vec<&str> = BulkAction::ALL.iter().map(|a| a.as_str()).collect();
        let errors = ValidationErrors::single(
            "action",
            format!(
                "\"{}\" is not a valid choice. Expected one of: {}.",
                request.action,
                allowed.join(", ")
            ),
        );
        return error_response(BulkError::Validation(errors)).into_response();
    };

    match state
        .bulk
        .submit(action, request.filters, request.payload, &actor)
        .await
    {
        Ok(operation) => {
            // Inline dispatch has already run it; report the stored state.
            let operation = match state.bulk.get(operation.id).await {
                Ok(current) => current,
                Err(_) => operation,
            };
            (StatusCode::CREATED, Json(json!(state.bulk.view(&operation)))).into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn list_operations(
    State(state): State<AppState>,
    _actor: RequestActor,
    Query(query): Query<OperationQuery>,
) -> impl IntoResponse {
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => match OperationStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                let errors = ValidationErrors::single(
                    "status",
                    format!("\"{}\" is not a valid status.", raw),
                );
                return error_response(BulkError::Validation(errors)).into_response();
            }
        },
    };

    let filter = OperationFilter {
        status,
        created_by_id: query.created_by,
    };

    match state.bulk.list(filter).await {
        Ok(operations) => {
            let views: Vec<_> = operations.iter().map(|op| state.bulk.view(op)).collect();
            (StatusCode::OK, Json(json!(views))).into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn get_operation(
    State(state): State<AppState>,
    _actor: RequestActor,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match state.bulk.get(id).await {
        Ok(operation) => (StatusCode::OK, Json(json!(state.bulk.view(&operation)))).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}
