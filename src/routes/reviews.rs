use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use uuid::Uuid;

use crate::{
    dto::reviews::{HelpfulToggle, RespondReviewRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Review,
    response::ApiResponse,
    services::review_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/helpful", post(toggle_helpful))
        .route("/{id}/respond", post(respond))
}

#[utoipa::path(
    post,
    path = "/api/reviews/{id}/helpful",
    params(
        ("id" = Uuid, Path, description = "Review ID")
    ),
    responses(
        (status = 200, description = "Vote toggled", body = ApiResponse<HelpfulToggle>),
        (status = 401, description = "Unauthenticated"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn toggle_helpful(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<HelpfulToggle>>> {
    let resp = review_service::toggle_helpful(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/reviews/{id}/respond",
    params(
        ("id" = Uuid, Path, description = "Review ID")
    ),
    request_body = RespondReviewRequest,
    responses(
        (status = 200, description = "Response recorded", body = ApiResponse<Review>),
        (status = 400, description = "Empty response or already responded"),
        (status = 403, description = "Not the listing's vendor"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn respond(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RespondReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let resp = review_service::respond(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
