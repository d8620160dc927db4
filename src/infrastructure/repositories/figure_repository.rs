//! SeaORM implementation of FigureRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::domain::{
    DomainError, Figure, FigureFilter, FigureRepository, FigureRole, ReviewStatus,
};
use crate::models::event::Entity as EventEntity;
use crate::models::figure::{ActiveModel, Column, Entity as FigureEntity};

/// Ids bound per `IN (...)` query; SQLite caps bound parameters per statement.
const ID_CHUNK_SIZE: usize = 500;

/// SeaORM-based implementation of FigureRepository
pub struct SeaOrmFigureRepository {
    db: DatabaseConnection,
}

impl SeaOrmFigureRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn condition_for(filter: &FigureFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(ids) = &filter.ids {
        condition = condition.add(Column::Id.is_in(ids.clone()));
    }

    if let Some(events) = &filter.events {
        condition = condition.add(Column::EventId.is_in(events.clone()));
    }

    if let Some(entries) = &filter.entries {
        condition = condition.add(Column::EntryId.is_in(entries.clone()));
    }

    if let Some(countries) = &filter.countries {
        condition = condition.add(Column::Country.is_in(countries.clone()));
    }

    if let Some(categories) = &filter.categories {
        condition = condition.add(Column::Category.is_in(categories.clone()));
    }

    if let Some(roles) = &filter.roles {
        condition = condition.add(Column::Role.is_in(roles.iter().map(|r| r.as_str())));
    }

    if let Some(include_idu) = filter.include_idu {
        condition = condition.add(Column::IncludeIdu.eq(include_idu));
    }

    condition
}

#[async_trait]
impl FigureRepository for SeaOrmFigureRepository {
    async fn count(&self, filter: &FigureFilter) -> Result<u64, DomainError> {
        let count = FigureEntity::find()
            .filter(condition_for(filter))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn find_ids(&self, filter: &FigureFilter, limit: u64) -> Result<Vec<i32>, DomainError> {
        let ids = FigureEntity::find()
            .select_only()
            .column(Column::Id)
            .filter(condition_for(filter))
            .order_by_asc(Column::Id)
            .limit(limit.min(i64::MAX as u64))
            .into_tuple::<i32>()
            .all(&self.db)
            .await?;
        Ok(ids)
    }

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Figure>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut figures = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(ID_CHUNK_SIZE) {
            let found = FigureEntity::find()
                .filter(Column::Id.is_in(chunk.to_vec()))
                .order_by_asc(Column::Id)
                .all(&self.db)
                .await?;
            figures.extend(found.into_iter().map(Figure::from));
        }
        Ok(figures)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Figure>, DomainError> {
        let figure = FigureEntity::find_by_id(id).one(&self.db).await?;
        Ok(figure.map(Figure::from))
    }

    async fn event_review_status(&self, event_id: i32) -> Result<Option<ReviewStatus>, DomainError> {
        let Some(event) = EventEntity::find_by_id(event_id).one(&self.db).await? else {
            return Ok(None);
        };

        ReviewStatus::parse(&event.review_status).map(Some).ok_or_else(|| {
            DomainError::Internal(format!(
                "event {} has unknown review status '{}'",
                event_id, event.review_status
            ))
        })
    }

    async fn update_role(
        &self,
        id: i32,
        role: FigureRole,
        modified_by: i32,
    ) -> Result<Figure, DomainError> {
        let existing = FigureEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let mut active: ActiveModel = existing.into();
        active.role = Set(role.as_str().to_owned());
        active.last_modified_by_id = Set(Some(modified_by));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let result = active.update(&self.db).await?;
        Ok(Figure::from(result))
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        let result = FigureEntity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::init_db;
    use crate::models::{event, figure};

    async fn setup() -> (DatabaseConnection, SeaOrmFigureRepository) {
        let db = init_db("sqlite::memory:").await.expect("Failed to init db");
        (db.clone(), SeaOrmFigureRepository::new(db))
    }

    async fn create_event(db: &DatabaseConnection, review_status: &str) -> i32 {
        let now = chrono::Utc::now().to_rfc3339();
        event::ActiveModel {
            name: Set("Floods".to_string()),
            country: Set("NPL".to_string()),
            review_status: Set(review_status.to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create event")
        .id
    }

    async fn create_figure(db: &DatabaseConnection, event_id: i32, country: &str, role: &str) -> i32 {
        let now = chrono::Utc::now().to_rfc3339();
        figure::ActiveModel {
            event_id: Set(event_id),
            entry_id: Set(100),
            country: Set(country.to_string()),
            category: Set("IDPS".to_string()),
            role: Set(role.to_string()),
            include_idu: Set(false),
            quantity: Set(250),
            last_modified_by_id: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create figure")
        .id
    }

    #[tokio::test]
    async fn test_filter_combines_criteria() {
        let (db, repo) = setup().await;
        let event_a = create_event(&db, "UNDER_REVIEW").await;
        let event_b = create_event(&db, "UNDER_REVIEW").await;
        let f1 = create_figure(&db, event_a, "NPL", "RECOMMENDED").await;
        let _f2 = create_figure(&db, event_a, "IND", "RECOMMENDED").await;
        let f3 = create_figure(&db, event_b, "NPL", "RECOMMENDED").await;
        let _f4 = create_figure(&db, event_b, "NPL", "TRIANGULATION").await;

        let filter = FigureFilter {
            countries: Some(vec!["NPL".to_string()]),
            roles: Some(vec![FigureRole::Recommended]),
            ..Default::default()
        };
        assert_eq!(repo.count(&filter).await.unwrap(), 2);
        assert_eq!(repo.find_ids(&filter, 10).await.unwrap(), vec![f1, f3]);
        assert_eq!(repo.find_ids(&filter, 1).await.unwrap(), vec![f1]);

        let by_event = FigureFilter {
            events: Some(vec![event_b]),
            ..Default::default()
        };
        assert_eq!(repo.count(&by_event).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_role_and_delete() {
        let (db, repo) = setup().await;
        let event_id = create_event(&db, "SIGNED_OFF").await;
        let id = create_figure(&db, event_id, "NPL", "RECOMMENDED").await;

        assert_eq!(
            repo.event_review_status(event_id).await.unwrap(),
            Some(ReviewStatus::SignedOff)
        );
        assert_eq!(repo.event_review_status(9999).await.unwrap(), None);

        let now = chrono::Utc::now().to_rfc3339();
        let editor = crate::models::user::ActiveModel {
            username: Set("editor".to_string()),
            role: Set("admin".to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .expect("Failed to create user")
        .id;

        let updated = repo
            .update_role(id, FigureRole::Triangulation, editor)
            .await
            .unwrap();
        assert_eq!(updated.role, "TRIANGULATION");
        assert_eq!(updated.last_modified_by_id, Some(editor));

        repo.delete(id).await.unwrap();
        assert!(repo.find_by_id(id).await.unwrap().is_none());
        assert!(matches!(repo.delete(id).await, Err(DomainError::NotFound)));
        assert!(repo.find_by_ids(&[id]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_ids_beyond_sqlite_variable_limit() {
        use sea_orm::{ConnectionTrait, Statement};

        let (db, repo) = setup().await;
        let event_id = create_event(&db, "UNDER_REVIEW").await;
        let now = chrono::Utc::now().to_rfc3339();

        // More rows than SQLite allows bound parameters in one statement
        db.execute(Statement::from_string(
            db.get_database_backend(),
            format!(
                r#"
                WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 33000)
                INSERT INTO figures (event_id, entry_id, country, category, role, include_idu,
                                     quantity, created_at, updated_at)
                SELECT {event_id}, n, 'NPL', 'IDPS', 'RECOMMENDED', 0, n, '{now}', '{now}' FROM seq
                "#
            ),
        ))
        .await
        .expect("Failed to insert figures");

        let filter = FigureFilter {
            events: Some(vec![event_id]),
            ..Default::default()
        };
        let ids = repo.find_ids(&filter, u64::MAX).await.unwrap();
        assert_eq!(ids.len(), 33000);

        let figures = repo.find_by_ids(&ids).await.unwrap();
        assert_eq!(figures.len(), 33000);
        assert_eq!(figures.iter().map(|f| f.id).collect::<Vec<_>>(), ids);
    }
}
