use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    dto::notifications::NotificationList,
    entity::notifications::{
        ActiveModel as NotificationActive, Column as NotificationCol, Entity as Notifications,
        Model as NotificationModel,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Notification,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::identity,
    state::AppState,
};

/// Insert a notification row; callable inside an open transaction so the
/// notification commits or rolls back with the event it describes.
pub async fn create_notification<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    kind: &str,
    title: &str,
    message: &str,
    metadata: Option<Value>,
) -> AppResult<Notification> {
    let row = NotificationActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        kind: Set(kind.to_string()),
        title: Set(title.to_string()),
        message: Set(message.to_string()),
        metadata: Set(metadata),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;

    Ok(notification_from_entity(row))
}

pub async fn list_notifications(
    state: &AppState,
    auth: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<NotificationList>> {
    let user = identity::resolve_user(state, auth).await?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Notifications::find()
        .filter(NotificationCol::UserId.eq(user.id))
        .order_by_desc(NotificationCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(notification_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Notifications",
        NotificationList { items },
        Some(meta),
    ))
}

/// Email delivery must never fail the request that triggered it.
pub async fn send_email_best_effort(state: &AppState, to: &str, subject: &str, body: &str) {
    if let Err(err) = state.mailer.send(to, subject, body).await {
        tracing::warn!(error = %err, "email delivery failed");
    }
}

fn notification_from_entity(model: NotificationModel) -> Notification {
    Notification {
        id: model.id,
        user_id: model.user_id,
        kind: model.kind,
        title: model.title,
        message: model.message,
        metadata: model.metadata,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
