use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult, models::ActivityType};

pub async fn record_activity(
    pool: &DbPool,
    user_id: Uuid,
    listing_id: Option<Uuid>,
    activity_type: ActivityType,
    metadata: Option<Value>,
) -> AppResult<()> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO user_activities (id, user_id, listing_id, activity_type, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(listing_id)
    .bind(activity_type.as_str())
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}
