use axum::{Json, Router, extract::State, routing::post};

use crate::{
    activity::record_activity,
    dto::activity::{ActivityTracked, TrackActivityRequest},
    error::{AppError, AppResult},
    middleware::auth::MaybeAuthUser,
    models::ActivityType,
    response::{ApiResponse, Meta},
    services::identity,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/track", post(track))
}

#[utoipa::path(
    post,
    path = "/api/activity/track",
    request_body = TrackActivityRequest,
    responses(
        (status = 200, description = "Activity tracked (or ignored for anonymous callers)", body = ApiResponse<ActivityTracked>),
        (status = 400, description = "Invalid activity type"),
        (status = 404, description = "User not found"),
    ),
    tag = "Activity"
)]
pub async fn track(
    State(state): State<AppState>,
    MaybeAuthUser(auth): MaybeAuthUser,
    Json(payload): Json<TrackActivityRequest>,
) -> AppResult<Json<ApiResponse<ActivityTracked>>> {
    // Anonymous callers succeed without writing anything, so client-side
    // tracking never has to special-case logged-out users.
    let Some(auth) = auth else {
        return Ok(Json(ApiResponse::success(
            "Activity ignored",
            ActivityTracked { tracked: false },
            Some(Meta::empty()),
        )));
    };

    let activity_type = payload
        .activity_type
        .as_deref()
        .and_then(ActivityType::parse)
        .ok_or_else(|| AppError::BadRequest("Invalid activity type".to_string()))?;

    let user = identity::resolve_user(&state, &auth).await?;

    record_activity(
        &state.pool,
        user.id,
        payload.listing_id,
        activity_type,
        payload.metadata,
    )
    .await?;

    Ok(Json(ApiResponse::success(
        "Activity tracked",
        ActivityTracked { tracked: true },
        Some(Meta::empty()),
    )))
}
