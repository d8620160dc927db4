use crate::models::{event, figure, user};
use sea_orm::*;

/// Demo users, events and figures for trying the bulk endpoints locally.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    let now = chrono::Utc::now().to_rfc3339();

    // 1. Users, one per role
    for (username, role) in [
        ("admin", "admin"),
        ("expert", "monitoring_expert"),
        ("coordinator", "regional_coordinator"),
        ("guest", "guest"),
    ] {
        let account = user::ActiveModel {
            username: Set(username.to_owned()),
            role: Set(role.to_owned()),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        };

        user::Entity::insert(account)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(user::Column::Username)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(db)
            .await?;
    }

    if event::Entity::find().count(db).await? > 0 {
        tracing::info!("Events already present, skipping figure seed");
        return Ok(());
    }

    // 2. Events with figures
    let events = [
        ("Nepal: Monsoon floods - Koshi", "NPL", "UNDER_REVIEW", 6),
        ("India: Cyclone Biparjoy", "IND", "REVIEW_IN_PROGRESS", 4),
        ("Nepal: Jajarkot earthquake", "NPL", "SIGNED_OFF", 3),
    ];

    let mut entry_id = 1;
    for (name, country, review_status, figure_count) in events {
        let created = event::ActiveModel {
            name: Set(name.to_owned()),
            country: Set(country.to_owned()),
            review_status: Set(review_status.to_owned()),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        for i in 0..figure_count {
            let category = if i % 2 == 0 { "NEW_DISPLACEMENT" } else { "IDPS" };
            figure::ActiveModel {
                event_id: Set(created.id),
                entry_id: Set(entry_id),
                country: Set(country.to_owned()),
                category: Set(category.to_owned()),
                role: Set("RECOMMENDED".to_owned()),
                include_idu: Set(i == 0),
                quantity: Set(500 * (i as i64 + 1)),
                last_modified_by_id: Set(None),
                created_at: Set(now.clone()),
                updated_at: Set(now.clone()),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
        entry_id += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::init_db;

    #[tokio::test]
    async fn test_seed_is_repeatable() {
        let db = init_db("sqlite::memory:").await.expect("Failed to init db");
        seed_demo_data(&db).await.expect("first seed");
        seed_demo_data(&db).await.expect("second seed");

        assert_eq!(user::Entity::find().count(&db).await.unwrap(), 4);
        assert_eq!(figure::Entity::find().count(&db).await.unwrap(), 13);
    }
}
