//! SeaORM implementation of OperationRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::de::DeserializeOwned;

use crate::domain::{
    BulkAction, DomainError, ExecutionReport, NewOperation, OperationFilter, OperationRepository,
    OperationRequest, OperationStatus, OutcomeEntry,
};
use crate::models::bulk_operation::{ActiveModel, Column, Entity as OperationEntity, Model};

/// SeaORM-based implementation of OperationRepository
pub struct SeaOrmOperationRepository {
    db: DatabaseConnection,
}

impl SeaOrmOperationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, DomainError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DomainError::Internal(format!("bad timestamp '{}': {}", value, e)))
}

fn parse_json<T: DeserializeOwned + Default>(value: Option<&str>) -> Result<T, DomainError> {
    match value {
        Some(raw) => Ok(serde_json::from_str(raw)?),
        None => Ok(T::default()),
    }
}

fn to_count(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl TryFrom<Model> for OperationRequest {
    type Error = DomainError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let action = BulkAction::parse(&model.action).ok_or_else(|| {
            DomainError::Internal(format!("unknown bulk action '{}'", model.action))
        })?;
        let status = OperationStatus::parse(&model.status).ok_or_else(|| {
            DomainError::Internal(format!("unknown bulk status '{}'", model.status))
        })?;

        Ok(OperationRequest {
            id: model.id,
            action,
            filters: serde_json::from_str(&model.filters)?,
            payload: serde_json::from_str(&model.payload)?,
            status,
            created_by_id: model.created_by_id,
            created_at: parse_time(&model.created_at)?,
            started_at: model.started_at.as_deref().map(parse_time).transpose()?,
            completed_at: model.completed_at.as_deref().map(parse_time).transpose()?,
            matched_count: model.matched_count.max(0) as u64,
            record_ids: serde_json::from_str(&model.record_ids)?,
            success_count: model.success_count.max(0) as u64,
            failure_count: model.failure_count.max(0) as u64,
            snapshot: model.snapshot,
            errors: parse_json(model.errors.as_deref())?,
            success_list: parse_json::<Vec<OutcomeEntry>>(model.success_list.as_deref())?,
            failure_list: parse_json::<Vec<OutcomeEntry>>(model.failure_list.as_deref())?,
        })
    }
}

#[async_trait]
impl OperationRepository for SeaOrmOperationRepository {
    async fn create(&self, operation: NewOperation) -> Result<OperationRequest, DomainError> {
        let new_operation = ActiveModel {
            action: Set(operation.action.as_str().to_owned()),
            filters: Set(operation.filters.to_string()),
            payload: Set(operation.payload.to_string()),
            status: Set(OperationStatus::Pending.as_str().to_owned()),
            created_by_id: Set(operation.created_by_id),
            created_at: Set(operation.created_at.to_rfc3339()),
            started_at: Set(None),
            completed_at: Set(None),
            matched_count: Set(to_count(operation.record_ids.len())),
            record_ids: Set(serde_json::to_string(&operation.record_ids)?),
            success_count: Set(0),
            failure_count: Set(0),
            snapshot: Set(None),
            errors: Set(None),
            success_list: Set(None),
            failure_list: Set(None),
            ..Default::default()
        };

        let result = new_operation.insert(&self.db).await?;
        OperationRequest::try_from(result)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<OperationRequest>, DomainError> {
        OperationEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(OperationRequest::try_from)
            .transpose()
    }

    async fn find_all(&self, filter: OperationFilter) -> Result<Vec<OperationRequest>, DomainError> {
        let mut condition = Condition::all();

        if let Some(status) = filter.status {
            condition = condition.add(Column::Status.eq(status.as_str()));
        }

        if let Some(created_by_id) = filter.created_by_id {
            condition = condition.add(Column::CreatedById.eq(created_by_id));
        }

        OperationEntity::find()
            .filter(condition)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(OperationRequest::try_from)
            .collect()
    }

    async fn pending_ids(&self, limit: u64) -> Result<Vec<i32>, DomainError> {
        let ids = OperationEntity::find()
            .select_only()
            .column(Column::Id)
            .filter(Column::Status.eq(OperationStatus::Pending.as_str()))
            .order_by_asc(Column::Id)
            .limit(limit)
            .into_tuple::<i32>()
            .all(&self.db)
            .await?;
        Ok(ids)
    }

    async fn mark_started(&self, id: i32, at: DateTime<Utc>) -> Result<bool, DomainError> {
        let result = OperationEntity::update_many()
            .col_expr(Column::Status, Expr::value(OperationStatus::InProgress.as_str()))
            .col_expr(Column::StartedAt, Expr::value(at.to_rfc3339()))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(OperationStatus::Pending.as_str()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn mark_killed(
        &self,
        id: i32,
        at: DateTime<Utc>,
        reason: String,
    ) -> Result<bool, DomainError> {
        let errors = serde_json::to_string(&vec![reason])?;
        let result = OperationEntity::update_many()
            .col_expr(Column::Status, Expr::value(OperationStatus::Killed.as_str()))
            .col_expr(Column::CompletedAt, Expr::value(at.to_rfc3339()))
            .col_expr(Column::Errors, Expr::value(errors))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(OperationStatus::Pending.as_str()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn save_snapshot(&self, id: i32, snapshot: &str) -> Result<bool, DomainError> {
        let result = OperationEntity::update_many()
            .col_expr(Column::Snapshot, Expr::value(snapshot.to_owned()))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(OperationStatus::InProgress.as_str()))
            .filter(Column::Snapshot.is_null())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn finish(
        &self,
        id: i32,
        status: OperationStatus,
        report: &ExecutionReport,
        at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        if !OperationStatus::InProgress.can_transition_to(status) {
            return Err(DomainError::Internal(format!(
                "cannot finish a bulk operation as {}",
                status
            )));
        }

        let errors = if report.errors.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&report.errors)?)
        };

        let result = OperationEntity::update_many()
            .col_expr(Column::Status, Expr::value(status.as_str()))
            .col_expr(Column::CompletedAt, Expr::value(at.to_rfc3339()))
            .col_expr(
                Column::SuccessCount,
                Expr::value(to_count(report.success_list.len())),
            )
            .col_expr(
                Column::FailureCount,
                Expr::value(to_count(report.failure_list.len())),
            )
            .col_expr(
                Column::SuccessList,
                Expr::value(serde_json::to_string(&report.success_list)?),
            )
            .col_expr(
                Column::FailureList,
                Expr::value(serde_json::to_string(&report.failure_list)?),
            )
            .col_expr(Column::Errors, Expr::value(errors))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(OperationStatus::InProgress.as_str()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::init_db;
    use serde_json::json;

    async fn setup() -> SeaOrmOperationRepository {
        let db = init_db("sqlite::memory:").await.expect("Failed to init db");
        let now = Utc::now().to_rfc3339();
        crate::models::user::ActiveModel {
            id: Set(1),
            username: Set("expert".to_string()),
            role: Set("monitoring_expert".to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        }
        .insert(&db)
        .await
        .expect("Failed to create user");
        SeaOrmOperationRepository::new(db)
    }

    fn new_operation(record_ids: Vec<i32>) -> NewOperation {
        NewOperation {
            action: BulkAction::FigureRole,
            filters: json!({ "figure_role": { "figure": { "events": [1] } } }),
            payload: json!({ "figure_role": { "role": "TRIANGULATION" } }),
            created_by_id: 1,
            created_at: Utc::now(),
            record_ids,
        }
    }

    #[tokio::test]
    async fn test_create_persists_pending_operation() {
        let repo = setup().await;
        let op = repo.create(new_operation(vec![3, 1, 2])).await.unwrap();

        assert_eq!(op.status, OperationStatus::Pending);
        assert_eq!(op.matched_count, 3);
        assert_eq!(op.record_ids, vec![3, 1, 2]);
        assert!(op.started_at.is_none());
        assert!(op.snapshot.is_none());

        let loaded = repo.find_by_id(op.id).await.unwrap().unwrap();
        assert_eq!(loaded, op);
    }

    #[tokio::test]
    async fn test_status_writes_are_conditional() {
        let repo = setup().await;
        let op = repo.create(new_operation(vec![1])).await.unwrap();
        let now = Utc::now();

        // Snapshot requires IN_PROGRESS
        assert!(!repo.save_snapshot(op.id, "[]").await.unwrap());

        assert!(repo.mark_started(op.id, now).await.unwrap());
        assert!(!repo.mark_started(op.id, now).await.unwrap());
        assert!(!repo.mark_killed(op.id, now, "late".into()).await.unwrap());

        assert!(repo.save_snapshot(op.id, "[{\"id\":1}]").await.unwrap());
        assert!(!repo.save_snapshot(op.id, "[]").await.unwrap());

        let report = ExecutionReport {
            success_list: vec![OutcomeEntry::success(1, None)],
            ..Default::default()
        };
        assert!(repo
            .finish(op.id, OperationStatus::Completed, &report, now)
            .await
            .unwrap());
        assert!(!repo
            .finish(op.id, OperationStatus::Failed, &report, now)
            .await
            .unwrap());

        let done = repo.find_by_id(op.id).await.unwrap().unwrap();
        assert_eq!(done.status, OperationStatus::Completed);
        assert_eq!(done.success_count, 1);
        assert_eq!(done.snapshot.as_deref(), Some("[{\"id\":1}]"));
    }

    #[tokio::test]
    async fn test_pending_ids_oldest_first_and_filtering() {
        let repo = setup().await;
        let first = repo.create(new_operation(vec![1])).await.unwrap();
        let second = repo.create(new_operation(vec![2])).await.unwrap();
        repo.mark_killed(first.id, Utc::now(), "stale".into())
            .await
            .unwrap();
        let third = repo.create(new_operation(vec![3])).await.unwrap();

        assert_eq!(repo.pending_ids(10).await.unwrap(), vec![second.id, third.id]);
        assert_eq!(repo.pending_ids(1).await.unwrap(), vec![second.id]);

        let killed = repo
            .find_all(OperationFilter {
                status: Some(OperationStatus::Killed),
                created_by_id: None,
            })
            .await
            .unwrap();
        assert_eq!(killed.len(), 1);
        assert_eq!(killed[0].errors, vec!["stale".to_string()]);

        let all = repo.find_all(OperationFilter::default()).await.unwrap();
        assert_eq!(all.first().map(|op| op.id), Some(third.id));
    }

    #[tokio::test]
    async fn test_finish_rejects_non_terminal_status() {
        let repo = setup().await;
        let op = repo.create(new_operation(vec![1])).await.unwrap();
        let result = repo
            .finish(op.id, OperationStatus::Killed, &ExecutionReport::default(), Utc::now())
            .await;
        assert!(result.is_err());
    }
}
