//! SeaORM implementation of IdentityProvider

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::domain::{Actor, DomainError, IdentityProvider, UserRole};
use crate::models::user::{Column, Entity as UserEntity, Model};

/// Resolves users from the `users` table
pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_actor(user: Model) -> Result<Actor, DomainError> {
    let role = UserRole::parse(&user.role).ok_or_else(|| {
        DomainError::Internal(format!("user {} has unknown role '{}'", user.id, user.role))
    })?;

    Ok(Actor {
        id: user.id,
        username: user.username,
        role,
    })
}

#[async_trait]
impl IdentityProvider for SeaOrmUserRepository {
    async fn resolve(&self, user_id: i32) -> Result<Actor, DomainError> {
        let user = UserEntity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;
        to_actor(user)
    }

    async fn resolve_username(&self, username: &str) -> Result<Actor, DomainError> {
        let user = UserEntity::find()
            .filter(Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;
        to_actor(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::init_db;
    use crate::models::user;
    use sea_orm::{ActiveModelTrait, Set};

    #[tokio::test]
    async fn test_resolve_by_id_and_name() {
        let db = init_db("sqlite::memory:").await.expect("Failed to init db");
        let now = chrono::Utc::now().to_rfc3339();
        let created = user::ActiveModel {
            username: Set("coordinator".to_string()),
            role: Set("regional_coordinator".to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .expect("Failed to create user");

        let repo = SeaOrmUserRepository::new(db);
        let by_id = repo.resolve(created.id).await.unwrap();
        assert_eq!(by_id.role, UserRole::RegionalCoordinator);
        assert_eq!(repo.resolve_username("coordinator").await.unwrap(), by_id);

        assert!(matches!(repo.resolve(999).await, Err(DomainError::NotFound)));
        assert!(matches!(
            repo.resolve_username("nobody").await,
            Err(DomainError::NotFound)
        ));
    }
}
